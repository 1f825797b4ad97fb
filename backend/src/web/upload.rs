//! Multipart bodies: text fields plus uploaded files.

use crate::error::AppError;
use crate::web::form::FormData;
use actix_multipart::Multipart;
use futures_util::StreamExt;

/// One uploaded file. Bytes past the file limit are dropped and `truncated` is set.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

/// Appends `chunk` while keeping `bytes` within `limit`. Returns false once
/// something had to be dropped.
fn append_capped(bytes: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(bytes.len());
    if chunk.len() > room {
        bytes.extend_from_slice(&chunk[..room]);
        false
    } else {
        bytes.extend_from_slice(chunk);
        true
    }
}

/// Reads the whole multipart body. File parts with an empty filename (an
/// untouched file input) are ignored. Files longer than `file_limit` come
/// back `truncated`; a text field longer than `text_limit` fails the whole
/// body with a validation error.
pub async fn read_multipart(
    mut payload: Multipart,
    file_limit: usize,
    text_limit: usize,
) -> Result<(FormData, Vec<Upload>), AppError> {
    let mut pairs = Vec::new();
    let mut uploads = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_owned(),
                cd.get_filename().map(str::to_owned),
            ),
            None => continue,
        };
        let content_type = field.content_type().map(|m| m.essence_str().to_owned());
        let limit = if filename.is_some() { file_limit } else { text_limit };

        let mut bytes = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if !append_capped(&mut bytes, &chunk, limit) {
                truncated = true;
            }
        }

        match filename {
            Some(filename) if !filename.is_empty() => uploads.push(Upload {
                field: name,
                filename,
                content_type,
                bytes,
                truncated,
            }),
            Some(_) => {}
            None if truncated => {
                return Err(AppError::validation(format!(
                    "Isian '{}' terlalu panjang (maksimal {} KB).",
                    name,
                    text_limit / 1024
                )));
            }
            None => pairs.push((name, String::from_utf8_lossy(&bytes).into_owned())),
        }
    }
    Ok((FormData::from(pairs), uploads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], 4, 4, true)]
    #[case(&[1, 2], 2, 4, true)]
    #[case(&[1, 2, 3], 3, 4, false)]
    fn chunks_are_capped(
        #[case] existing: &[u8],
        #[case] chunk_len: usize,
        #[case] expected_len: usize,
        #[case] fits: bool,
    ) {
        let mut bytes = existing.to_vec();
        assert_eq!(append_capped(&mut bytes, &vec![9; chunk_len], 4), fits);
        assert_eq!(bytes.len(), expected_len);
    }

    #[test]
    fn full_buffer_drops_everything_after() {
        let mut bytes = vec![0; 4];
        assert!(!append_capped(&mut bytes, &[1], 4));
        assert!(append_capped(&mut bytes, &[], 4));
        assert_eq!(bytes, vec![0; 4]);
    }
}
