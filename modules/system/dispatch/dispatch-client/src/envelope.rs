use dispatch_sdk::{DispatchFailure, Value};

/// The `{code, msg, data}` shape every backend response must reshape into.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub code: i64,
    pub msg: String,
    pub data: Option<Value>,
}

impl Envelope {
    /// `code` must be an integer and `msg` a string; `data` must be present but
    /// may be `null`.
    pub fn from_value(value: Value) -> Result<Self, DispatchFailure> {
        let Value::Object(mut fields) = value else {
            return Err(DispatchFailure::EnvelopeNotObject);
        };

        let code = match fields.remove("code") {
            None => return Err(DispatchFailure::MissingField { field: "code" }),
            Some(v) => v.as_i64().ok_or(DispatchFailure::FieldType {
                field: "code",
                expected: "an integer",
            })?,
        };

        let msg = match fields.remove("msg") {
            None => return Err(DispatchFailure::MissingField { field: "msg" }),
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(DispatchFailure::FieldType {
                    field: "msg",
                    expected: "a string",
                });
            }
        };

        let data = match fields.remove("data") {
            None => return Err(DispatchFailure::MissingField { field: "data" }),
            Some(Value::Null) => None,
            Some(v) => Some(v),
        };

        Ok(Self { code, msg, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_envelope() {
        let env =
            Envelope::from_value(json!({"code": 200, "msg": "ok", "data": {"id": 1}})).unwrap();
        assert_eq!(
            env,
            Envelope {
                code: 200,
                msg: "ok".into(),
                data: Some(json!({"id": 1})),
            }
        );
    }

    #[test]
    fn test_null_data_is_no_payload() {
        let env = Envelope::from_value(json!({"code": 0, "msg": "", "data": null})).unwrap();
        assert_eq!(env.data, None);
    }

    #[test]
    fn test_negative_code() {
        let env = Envelope::from_value(json!({"code": -3, "msg": "x", "data": 1})).unwrap();
        assert_eq!(env.code, -3);
    }

    #[test]
    fn test_shape_failures() {
        let cases = [
            (json!([1, 2]), DispatchFailure::EnvelopeNotObject),
            (
                json!({"msg": "ok", "data": null}),
                DispatchFailure::MissingField { field: "code" },
            ),
            (
                json!({"code": "200", "msg": "ok", "data": null}),
                DispatchFailure::FieldType {
                    field: "code",
                    expected: "an integer",
                },
            ),
            (
                json!({"code": 1.5, "msg": "ok", "data": null}),
                DispatchFailure::FieldType {
                    field: "code",
                    expected: "an integer",
                },
            ),
            (
                json!({"code": 200, "data": null}),
                DispatchFailure::MissingField { field: "msg" },
            ),
            (
                json!({"code": 200, "msg": 5, "data": null}),
                DispatchFailure::FieldType {
                    field: "msg",
                    expected: "a string",
                },
            ),
            (
                json!({"code": 200, "msg": "ok"}),
                DispatchFailure::MissingField { field: "data" },
            ),
        ];

        for (value, expected) in cases {
            assert_eq!(Envelope::from_value(value).unwrap_err(), expected);
        }
    }
}
