//! JSON payloads for structured responses.
//!
//! A response carries zero, one, or several values:
//!
//! | Value passed                 | Body written   |
//! |------------------------------|----------------|
//! | `()` / `Payload::Empty`      | nothing        |
//! | `Json(x)`, `"msg"`, a `Value`| `x`            |
//! | `(x, y)`                     | `[x, y]`       |
//!
//! A single value is never wrapped in an array.

use serde::Serialize;
use serde_json::Value;

/// The body of a structured response, before encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Empty,
    Single(Value),
    Multiple(Vec<Value>),
}

impl Payload {
    /// Serializes one value.
    pub fn single<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Single)
    }

    /// Normalizes by count: none is `Empty`, one is `Single`, more is `Multiple`.
    pub fn from_values(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => Self::Empty,
            1 => Self::Single(values.remove(0)),
            _ => Self::Multiple(values),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Encodes the payload. `Ok(None)` means there is no body to write.
    pub(crate) fn encode(&self) -> Result<Option<Vec<u8>>, serde_json::Error> {
        match self {
            Self::Empty => Ok(None),
            Self::Single(v) => serde_json::to_vec(v).map(Some),
            Self::Multiple(vs) => serde_json::to_vec(vs).map(Some),
        }
    }
}

/// Wraps any serializable value as a single-value payload.
#[derive(Clone, Copy, Debug)]
pub struct Json<T>(pub T);

/// Conversion into a [`Payload`]. Serialization may fail; the response
/// helpers turn that failure into a `500` with no body.
pub trait IntoPayload {
    fn into_payload(self) -> Result<Payload, serde_json::Error>;
}

impl IntoPayload for Payload {
    fn into_payload(self) -> Result<Payload, serde_json::Error> { Ok(self) }
}

impl IntoPayload for () {
    fn into_payload(self) -> Result<Payload, serde_json::Error> { Ok(Payload::Empty) }
}

impl IntoPayload for Value {
    fn into_payload(self) -> Result<Payload, serde_json::Error> { Ok(Payload::Single(self)) }
}

impl IntoPayload for &str {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Single(Value::String(self.to_owned())))
    }
}

impl IntoPayload for String {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Single(Value::String(self)))
    }
}

impl<T: Serialize> IntoPayload for Json<T> {
    fn into_payload(self) -> Result<Payload, serde_json::Error> {
        Payload::single(&self.0)
    }
}

macro_rules! tuple_payload {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> IntoPayload for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_payload(self) -> Result<Payload, serde_json::Error> {
                let ($($name,)+) = self;
                Ok(Payload::from_values(vec![$(serde_json::to_value($name)?),+]))
            }
        }
    };
}

tuple_payload!(A);
tuple_payload!(A, B);
tuple_payload!(A, B, C);
tuple_payload!(A, B, C, D);
tuple_payload!(A, B, C, D, E);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn from_values_normalizes_by_count() {
        assert_eq!(Payload::from_values(vec![]), Payload::Empty);
        assert_eq!(Payload::from_values(vec![json!(1)]), Payload::Single(json!(1)));
        assert_eq!(
            Payload::from_values(vec![json!(1), json!("two")]),
            Payload::Multiple(vec![json!(1), json!("two")]),
        );
    }

    #[test]
    fn tuples_become_ordered_sequences() {
        let p = (1, "two", json!({"three": 3})).into_payload().unwrap();
        assert_eq!(p.encode().unwrap().unwrap(), br#"[1,"two",{"three":3}]"#);

        let one = (json!({"id": 1}),).into_payload().unwrap();
        assert_eq!(one.encode().unwrap().unwrap(), br#"{"id":1}"#);
    }

    #[test]
    fn empty_encodes_to_nothing() {
        assert_eq!(().into_payload().unwrap().encode().unwrap(), None);
    }

    #[test]
    fn unserializable_value_fails() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON object keys");
        assert!(Json(bad).into_payload().is_err());
    }
}
