//! Fork-join elementwise map.
//!
//! The input range is halved recursively: while branch budget remains, one
//! half runs on a freshly spawned scoped thread and the current thread
//! recurses into the other half; at budget zero the remaining range is
//! computed serially. The two halves write to disjoint `split_at_mut`
//! partitions of the caller-owned output buffer, so no index is ever
//! written by two threads and no locking is needed. `std::thread::scope`
//! is the join barrier: the caller observes fully written output. There is
//! no cancellation; the map always runs to completion.

use std::thread;

/// Parallel equivalent of `vector::map`: `out[i] = op(data[i])`, with
/// roughly `2^branch` concurrent threads. Output is identical to the
/// serial map for every branch factor and input size.
pub fn parallel_map(data: &[f64], branch: u32, op: impl Fn(f64) -> f64 + Sync) -> Vec<f64> {
    let mut out = vec![0.0; data.len()];
    par_helper(data, &mut out, branch, &op);
    out
}

fn par_helper<F>(data: &[f64], out: &mut [f64], branch: u32, op: &F)
where
    F: Fn(f64) -> f64 + Sync,
{
    if data.is_empty() {
        return;
    }

    if branch == 0 {
        for (o, &x) in out.iter_mut().zip(data.iter()) {
            *o = op(x);
        }
        return;
    }

    let mid = data.len() / 2;
    let (data_lo, data_hi) = data.split_at(mid);
    let (out_lo, out_hi) = out.split_at_mut(mid);

    thread::scope(|s| {
        s.spawn(move || par_helper(data_lo, out_lo, branch - 1, op));
        par_helper(data_hi, out_hi, branch - 1, op);
    });
}
