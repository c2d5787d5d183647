use ffnet::math::vector;
use ffnet::parallel::parallel_map;

fn op(x: f64) -> f64 {
    x * x - 0.5 * x + 1.0
}

#[test]
fn matches_serial_map_for_every_branch_factor_and_size() {
    for size in [0usize, 1, 2, 3, 7, 16, 63, 64, 1000] {
        let data: Vec<f64> = (0..size).map(|i| i as f64 * 0.37 - 3.0).collect();
        let expected = vector::map(&data, op);
        for branch in 0..=4 {
            assert_eq!(
                parallel_map(&data, branch, op),
                expected,
                "branch {} size {}",
                branch,
                size
            );
        }
    }
}

#[test]
fn output_length_always_matches_input() {
    let data = vec![1.5; 13];
    assert_eq!(parallel_map(&data, 3, |x| x).len(), data.len());
}

#[test]
fn every_index_is_written_exactly_once() {
    // op is injective on this input, so any double-write or skipped index
    // would surface as a wrong value somewhere
    let data: Vec<f64> = (0..257).map(|i| i as f64).collect();
    let out = parallel_map(&data, 4, |x| x + 1.0);
    for (i, &v) in out.iter().enumerate() {
        assert_eq!(v, i as f64 + 1.0);
    }
}
