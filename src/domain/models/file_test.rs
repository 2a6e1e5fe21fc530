use std::io::Write;

use anyhow::Result;
use tempfile::TempDir;

use super::is_supported_file;
use super::LocalFile;
use super::UploadResult;
use crate::domain::models::ApiError;

#[test]
fn it_checks_supported_extensions() {
    assert!(is_supported_file("report.pdf"));
    assert!(is_supported_file("Slides.PPTX"));
    assert!(is_supported_file("notes.md"));
    assert!(!is_supported_file("archive.zip"));
    assert!(!is_supported_file("Makefile"));
}

#[test]
fn it_rejects_unsupported_local_files() {
    let res = LocalFile::new("image.png", vec![1, 2, 3]);
    let err = res.unwrap_err();
    let api_err = err.downcast_ref::<ApiError>().unwrap();
    assert!(matches!(api_err, ApiError::Validation(_)));
}

#[test]
fn it_sets_mime_types() -> Result<()> {
    let file = LocalFile::new("data.csv", b"a,b".to_vec())?;
    assert_eq!(file.mime_type, "text/csv");
    assert_eq!(file.size(), 3);

    return Ok(());
}

#[tokio::test]
async fn it_reads_local_files_from_disk() -> Result<()> {
    let tmp_dir = TempDir::new()?;
    let file_path = tmp_dir.path().join("readme.txt");
    let mut file = std::fs::File::create(&file_path)?;
    file.write_all(b"hello world")?;

    let local = LocalFile::from_path(&file_path).await?;
    assert_eq!(local.name, "readme.txt");
    assert_eq!(local.bytes, b"hello world".to_vec());

    return Ok(());
}

#[tokio::test]
async fn it_does_not_read_unsupported_files() {
    let res = LocalFile::from_path(std::path::Path::new("/does/not/exist.exe")).await;
    let err = res.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Validation(_))
    ));
}

#[test]
fn it_parses_mixed_upload_results() -> Result<()> {
    let body = r#"[
        {
            "uuid": "f-1",
            "filename": "a.pdf",
            "source": "local",
            "added": "2025-01-01T00:00:00+00:00",
            "owner_uuid": "u-1",
            "encoded_content": {"1": "first page", "2": "second page"}
        },
        {"filename": "b.pdf", "error": "Failed to process file: corrupt"}
    ]"#;

    let res: Vec<UploadResult> = serde_json::from_str(body)?;
    assert_eq!(res.len(), 2);

    let record = res[0].record().unwrap();
    assert_eq!(record.filename, "a.pdf");
    assert!(record.has_content());
    assert_eq!(
        record.encoded_content.as_ref().unwrap().get(&2),
        Some(&"second page".to_string())
    );
    assert!(!record.without_content().has_content());

    assert!(res[1].record().is_none());
    assert_eq!(res[1].filename(), "b.pdf");

    return Ok(());
}
