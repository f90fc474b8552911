use serde_json::Value;

/// Invalid UTF-8 inside strings is tolerated, numbers must fit in an `f64`.
fn is_json(bytes: &[u8]) -> bool {
    serde_json::from_str::<Value>(&String::from_utf8_lossy(bytes)).is_ok()
}

/// Returns the part of a raw log line that should be forwarded, if any.
///
/// The line is accepted verbatim when it is a JSON value. Otherwise
/// everything up to and including the first space is dropped and the rest
/// is tried again, which strips the timestamp Docker prepends when
/// timestamps are requested.
pub fn extract_structured(line: &[u8]) -> Option<&[u8]> {
    if line.is_empty() {
        return None;
    }
    if is_json(line) {
        return Some(line);
    }
    let space = line.iter().position(|&b| b == b' ')?;
    let rest = &line[space + 1..];
    if !rest.is_empty() && is_json(rest) {
        return Some(rest);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2024-01-01T00:00:00.000000000Z";

    #[test]
    fn test_empty_line() {
        assert_eq!(extract_structured(b""), None);
    }

    #[test]
    fn test_plain_json_is_forwarded_verbatim() {
        let lines: [&[u8]; 4] = [
            br#"{"msg":"hi"}"#,
            br#"{"level":"info", "msg":"with spaces"}"#,
            br#"[1, 2, 3]"#,
            br#""a string""#,
        ];
        for line in lines {
            assert_eq!(extract_structured(line), Some(line));
        }
    }

    #[test]
    fn test_timestamp_is_stripped() {
        let payload = r#"{"level":"warn","msg":"disk almost full"}"#;
        let line = format!("{TS} {payload}");
        assert_eq!(
            extract_structured(line.as_bytes()),
            Some(payload.as_bytes())
        );
    }

    #[test]
    fn test_non_json_is_dropped() {
        assert_eq!(extract_structured(b"plain text output"), None);
        assert_eq!(
            extract_structured(format!("{TS} plain text output").as_bytes()),
            None
        );
        assert_eq!(extract_structured(b"{\"truncated\":"), None);
    }

    #[test]
    fn test_trailing_space_only() {
        assert_eq!(extract_structured(format!("{TS} ").as_bytes()), None);
    }

    #[test]
    fn test_only_first_space_is_stripped() {
        // The second token is not JSON on its own, so nothing is forwarded.
        let line = format!("{TS} extra {{\"msg\":\"hi\"}}");
        assert_eq!(extract_structured(line.as_bytes()), None);
    }

    #[test]
    fn test_out_of_range_number_is_dropped() {
        assert_eq!(extract_structured(b"1e400"), None);
        assert_eq!(extract_structured(br#"{"big":-1e400}"#), None);
        assert_eq!(
            extract_structured(format!("{TS} {{\"big\":1e400}}").as_bytes()),
            None
        );
        assert_eq!(extract_structured(b"1e-400"), Some(&b"1e-400"[..]));
    }

    #[test]
    fn test_invalid_utf8_inside_string_is_forwarded() {
        let line: &[u8] = b"{\"msg\":\"\xff\xfe\"}";
        assert_eq!(extract_structured(line), Some(line));

        let mut stamped = format!("{TS} ").into_bytes();
        stamped.extend_from_slice(line);
        assert_eq!(extract_structured(&stamped), Some(line));

        assert_eq!(extract_structured(b"\xff{}"), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use serde_json::{Map, Value};

        fn json_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::from),
                any::<u64>().prop_map(Value::from),
                (-1.0e300f64..1.0e300).prop_map(Value::from),
                ".{0,16}".prop_map(Value::String),
            ];
            leaf.prop_recursive(4, 64, 8, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                    prop::collection::vec((".{0,8}", inner), 0..8).prop_map(|entries| {
                        Value::Object(entries.into_iter().collect::<Map<_, _>>())
                    }),
                ]
            })
        }

        proptest! {
            #[test]
            fn json_line_is_forwarded_verbatim(value in json_value(), pretty in any::<bool>()) {
                let line = if pretty {
                    serde_json::to_string_pretty(&value).unwrap()
                } else {
                    serde_json::to_string(&value).unwrap()
                };
                prop_assert_eq!(extract_structured(line.as_bytes()), Some(line.as_bytes()));
            }

            #[test]
            fn leading_token_is_stripped(value in json_value(), token in "[^\\s]{1,40}") {
                let payload = serde_json::to_string(&value).unwrap();
                let line = format!("{token} {payload}");
                prop_assert_eq!(extract_structured(line.as_bytes()), Some(payload.as_bytes()));
            }

            #[test]
            fn docker_timestamp_is_stripped(
                value in json_value(),
                stamp in "[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\\.[0-9]{9}Z",
            ) {
                let payload = serde_json::to_string(&value).unwrap();
                let line = format!("{stamp} {payload}");
                prop_assert_eq!(extract_structured(line.as_bytes()), Some(payload.as_bytes()));
            }

            #[test]
            fn arbitrary_bytes_do_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
                let _ = extract_structured(&bytes);
            }
        }
    }
}
