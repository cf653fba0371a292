//! Purpose: Read and parse the save payload from an argument, a file, or stdin.
//! Exports: payload_from_arg, payload_from_file, payload_from_reader, missing_payload_error.
//! Role: CLI-side input handling; the library only ever sees parsed JSON.
//! Invariants: A payload is exactly one JSON value; trailing content is an error.

use satchel::api::{ApiResult, Error, ErrorKind};
use serde_json::Value;
use std::io::Read;

pub fn payload_from_arg(data: &str) -> ApiResult<Value> {
    serde_json::from_str(data).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid json payload")
            .with_hint("Provide a single JSON value (e.g. '{\"a\":1}').")
            .with_source(err)
    })
}

pub fn payload_from_file(path: &str) -> ApiResult<Value> {
    if path == "-" {
        return payload_from_reader(std::io::stdin());
    }
    let file = std::fs::File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read payload file")
            .with_path(path)
            .with_source(err)
    })?;
    payload_from_reader(file).map_err(|err| err.with_path(path))
}

pub fn payload_from_reader(mut reader: impl Read) -> ApiResult<Value> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read payload")
            .with_source(err)
    })?;
    let trimmed = buf.trim();
    if trimmed.is_empty() {
        return Err(missing_payload_error());
    }
    serde_json::from_str(trimmed).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid json payload")
            .with_source(err)
    })
}

pub fn missing_payload_error() -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("missing payload input")
        .with_hint("Provide JSON via DATA, --file, or pipe JSON to stdin.")
}

#[cfg(test)]
mod tests {
    use super::{payload_from_arg, payload_from_file, payload_from_reader};
    use satchel::api::ErrorKind;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn inline_payload_parses() {
        let value = payload_from_arg("{\"a\":1}").expect("value");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn inline_payload_rejects_invalid_json() {
        let err = payload_from_arg("{nope").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn reader_payload_rejects_trailing_content() {
        let err = payload_from_reader("{} {}".as_bytes()).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn reader_payload_rejects_empty_input() {
        let err = payload_from_reader("  \n".as_bytes()).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn file_payload_reports_missing_file_as_io() {
        let err = payload_from_file("/no/such/payload.json").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.path().is_some());
    }

    #[test]
    fn file_payload_parses_and_carries_path_on_error() {
        let mut good = tempfile::NamedTempFile::new().expect("tempfile");
        write!(good, "[1, 2, 3]").expect("write");
        let value =
            payload_from_file(good.path().to_str().expect("utf8 path")).expect("value");
        assert_eq!(value, json!([1, 2, 3]));

        let mut bad = tempfile::NamedTempFile::new().expect("tempfile");
        write!(bad, "not json").expect("write");
        let err = payload_from_file(bad.path().to_str().expect("utf8 path")).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.path().is_some());
    }
}
