use std::fs;

use ffnet::error::DecodeError;
use ffnet::loader::{
    argmax_match, decode_pair, IdxLoader, Loader, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC,
};
use ffnet::network::Example;

/// Synthesize an IDX image buffer: 2x2 images, one per label.
fn image_bytes(images: &[[u8; 4]]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&IDX_IMAGE_MAGIC.to_be_bytes());
    buf.extend_from_slice(&(images.len() as u32).to_be_bytes());
    buf.extend_from_slice(&2u32.to_be_bytes());
    buf.extend_from_slice(&2u32.to_be_bytes());
    for img in images {
        buf.extend_from_slice(img);
    }
    buf
}

fn label_bytes(labels: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&IDX_LABEL_MAGIC.to_be_bytes());
    buf.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    buf.extend_from_slice(labels);
    buf
}

#[test]
fn decodes_images_and_one_hot_labels() {
    let imgs = image_bytes(&[[0, 128, 255, 1], [9, 8, 7, 6]]);
    let lbls = label_bytes(&[3, 9]);

    let examples = decode_pair(&imgs, &lbls, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC)
        .expect("well-formed buffers decode");

    assert_eq!(examples.len(), 2);
    assert_eq!(examples[0].input(), &[0.0, 128.0, 255.0, 1.0]);
    assert_eq!(examples[1].input(), &[9.0, 8.0, 7.0, 6.0]);

    let mut expected = vec![0.0; 10];
    expected[3] = 1.0;
    assert_eq!(examples[0].output(), expected.as_slice());
    assert_eq!(examples[1].output()[9], 1.0);
    assert_eq!(examples[1].output().iter().sum::<f64>(), 1.0);
}

#[test]
fn rejects_a_wrong_magic_number() {
    let imgs = image_bytes(&[[0; 4]]);
    let lbls = label_bytes(&[0]);

    let err = decode_pair(&imgs, &lbls, 1234, IDX_LABEL_MAGIC).unwrap_err();
    assert_eq!(
        err,
        DecodeError::BadMagic {
            expected: 1234,
            found: IDX_IMAGE_MAGIC
        }
    );
}

#[test]
fn rejects_mismatched_record_counts() {
    let imgs = image_bytes(&[[0; 4], [1; 4]]);
    let lbls = label_bytes(&[5]);

    let err = decode_pair(&imgs, &lbls, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC).unwrap_err();
    assert_eq!(err, DecodeError::CountMismatch { images: 2, labels: 1 });
}

#[test]
fn rejects_truncated_buffers_and_bad_labels() {
    let mut imgs = image_bytes(&[[0; 4]]);
    imgs.truncate(imgs.len() - 1);
    let lbls = label_bytes(&[0]);
    assert_eq!(
        decode_pair(&imgs, &lbls, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC).unwrap_err(),
        DecodeError::Truncated
    );

    let imgs = image_bytes(&[[0; 4]]);
    let lbls = label_bytes(&[10]);
    assert_eq!(
        decode_pair(&imgs, &lbls, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC).unwrap_err(),
        DecodeError::BadLabel(10)
    );
}

#[test]
fn rejects_oversized_header_dimensions() {
    // 4 claimed images of 2^31 x 2^31 pixels: the record-size product
    // overflows usize; decoding must fail like any short buffer, not panic
    let mut imgs = Vec::new();
    imgs.extend_from_slice(&IDX_IMAGE_MAGIC.to_be_bytes());
    imgs.extend_from_slice(&4u32.to_be_bytes());
    imgs.extend_from_slice(&(1u32 << 31).to_be_bytes());
    imgs.extend_from_slice(&(1u32 << 31).to_be_bytes());
    let lbls = label_bytes(&[0, 1, 2, 3]);

    assert_eq!(
        decode_pair(&imgs, &lbls, IDX_IMAGE_MAGIC, IDX_LABEL_MAGIC).unwrap_err(),
        DecodeError::Truncated
    );
}

#[test]
fn loads_a_file_pair_from_disk() {
    let dir = std::env::temp_dir().join("ffnet-idx-loader-test");
    fs::create_dir_all(&dir).expect("temp dir");
    let img_path = dir.join("images-idx3-ubyte");
    let lbl_path = dir.join("labels-idx1-ubyte");

    fs::write(&img_path, image_bytes(&[[10, 20, 30, 40]])).expect("write images");
    fs::write(&lbl_path, label_bytes(&[7])).expect("write labels");

    let examples = IdxLoader::new(&img_path, &lbl_path)
        .load()
        .expect("loads from disk");
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].input(), &[10.0, 20.0, 30.0, 40.0]);
    assert_eq!(examples[0].output()[7], 1.0);
}

#[test]
fn custom_magic_numbers_via_the_builder() {
    let dir = std::env::temp_dir().join("ffnet-idx-custom-magic-test");
    fs::create_dir_all(&dir).expect("temp dir");
    let img_path = dir.join("images");
    let lbl_path = dir.join("labels");

    let mut imgs = image_bytes(&[[1, 2, 3, 4]]);
    imgs[..4].copy_from_slice(&7777u32.to_be_bytes());
    let mut lbls = label_bytes(&[2]);
    lbls[..4].copy_from_slice(&8888u32.to_be_bytes());
    fs::write(&img_path, imgs).expect("write images");
    fs::write(&lbl_path, lbls).expect("write labels");

    // the default magics reject these files; overriding them loads
    assert!(IdxLoader::new(&img_path, &lbl_path).load().is_err());

    let examples = IdxLoader::new(&img_path, &lbl_path)
        .with_magic(7777, 8888)
        .load()
        .expect("loads with overridden magics");
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].output()[2], 1.0);
}

#[test]
fn missing_files_surface_an_io_error() {
    let loader = IdxLoader::new("/nonexistent/images", "/nonexistent/labels");
    assert!(loader.load().is_err());
}

#[test]
fn argmax_match_compares_peak_indices() {
    assert!(argmax_match(&[0.1, 0.9, 0.0], &[0.0, 1.0, 0.0]));
    assert!(!argmax_match(&[0.9, 0.1, 0.0], &[0.0, 1.0, 0.0]));
    // ties resolve to the first index, as in the evaluation matcher
    assert!(argmax_match(&[0.5, 0.5], &[1.0, 0.0]));
    assert!(!argmax_match(&[], &[1.0]));
}
