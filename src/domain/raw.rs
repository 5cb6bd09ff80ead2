//! Lenient field extraction over raw upstream JSON.
//!
//! Upstream records are duck-typed: the same field arrives under different
//! names, as a number or a numeric string, nested or flat. Every adapter
//! goes through these helpers so the rest of the crate only ever sees
//! canonical types. Malformed fields become zero/empty; a bad field never
//! fails a record and a bad record never fails a batch.

use crate::domain::{Decimal, PartyRef, SdId};
use serde_json::Value;

/// First present field among `keys`, as a string. Numbers are stringified
/// (upstream ids flip between the two).
pub fn str_field(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match v.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First present field among `keys`, as an opaque id.
pub fn id_field(v: &Value, keys: &[&str]) -> Option<SdId> {
    str_field(v, keys).map(SdId::new)
}

/// First present field among `keys`, as a decimal amount. Accepts numbers
/// and numeric strings; anything else is zero.
pub fn num_field(v: &Value, keys: &[&str]) -> Decimal {
    for key in keys {
        match v.get(key) {
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Decimal::from_i64(i);
                }
                if let Some(f) = n.as_f64() {
                    return Decimal::from_f64_lossy(f);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(d) = Decimal::from_str_canonical(s.trim()) {
                    return d;
                }
            }
            _ => {}
        }
    }
    Decimal::zero()
}

/// First present field among `keys`, as an integer. Zero when absent or
/// malformed.
pub fn int_field(v: &Value, keys: &[&str]) -> i64 {
    for key in keys {
        match v.get(key) {
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return i;
                }
            }
            Some(Value::String(s)) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return i;
                }
            }
            _ => {}
        }
    }
    0
}

/// Party reference from either a nested object (`client: {id, name}`) or
/// flat fields (`clientId` / `clientName`). Falls back to the unknown
/// placeholder.
pub fn party_field(v: &Value, nested_key: &str, id_keys: &[&str], name_keys: &[&str]) -> PartyRef {
    if let Some(obj) = v.get(nested_key) {
        if let Some(id) = id_field(obj, &["id", "_id"]) {
            let name = str_field(obj, &["name", "fullName", "title"]).unwrap_or_default();
            return PartyRef { id, name };
        }
    }
    if let Some(id) = id_field(v, id_keys) {
        let name = str_field(v, name_keys).unwrap_or_default();
        return PartyRef { id, name };
    }
    PartyRef::unknown()
}

/// Type reference (`paymentType`, `priceType`) from a nested object, a bare
/// scalar, or a flat `...Id` field.
pub fn type_ref_field(v: &Value, nested_key: &str, flat_key: &str) -> Option<SdId> {
    match v.get(nested_key) {
        Some(obj @ Value::Object(_)) => {
            if let Some(id) = id_field(obj, &["id", "_id"]) {
                return Some(id);
            }
        }
        Some(Value::String(s)) if !s.is_empty() => return Some(SdId::new(s.clone())),
        Some(Value::Number(n)) => return Some(SdId::new(n.to_string())),
        _ => {}
    }
    id_field(v, &[flat_key])
}

/// Array field with naming variants; empty slice when absent.
pub fn array_field<'a>(v: &'a Value, keys: &[&str]) -> &'a [Value] {
    for key in keys {
        if let Some(Value::Array(items)) = v.get(key) {
            return items;
        }
    }
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_field_variants() {
        let v = json!({"dateCreate": "2024-05-01", "n": 7});
        assert_eq!(
            str_field(&v, &["dateDocument", "dateCreate"]),
            Some("2024-05-01".to_string())
        );
        assert_eq!(str_field(&v, &["n"]), Some("7".to_string()));
        assert_eq!(str_field(&v, &["missing"]), None);
    }

    #[test]
    fn test_num_field_accepts_numbers_and_strings() {
        let v = json!({"a": 500000, "b": "150.5", "c": "garbage", "d": null});
        assert_eq!(num_field(&v, &["a"]), Decimal::from_i64(500000));
        assert_eq!(
            num_field(&v, &["b"]),
            Decimal::from_str_canonical("150.5").unwrap()
        );
        assert_eq!(num_field(&v, &["c"]), Decimal::zero());
        assert_eq!(num_field(&v, &["d"]), Decimal::zero());
        assert_eq!(num_field(&v, &["missing"]), Decimal::zero());
    }

    #[test]
    fn test_party_field_nested_and_flat() {
        let nested = json!({"client": {"id": 12, "name": "Ali"}});
        let p = party_field(&nested, "client", &["clientId"], &["clientName"]);
        assert_eq!(p.id, SdId::new("12"));
        assert_eq!(p.name, "Ali");

        let flat = json!({"clientId": "12", "clientName": "Ali"});
        let p = party_field(&flat, "client", &["clientId"], &["clientName"]);
        assert_eq!(p.id, SdId::new("12"));
        assert_eq!(p.name, "Ali");

        let absent = json!({});
        let p = party_field(&absent, "client", &["clientId"], &["clientName"]);
        assert!(p.id.is_empty());
    }

    #[test]
    fn test_type_ref_field_shapes() {
        assert_eq!(
            type_ref_field(&json!({"paymentType": {"id": 4}}), "paymentType", "paymentTypeId"),
            Some(SdId::new("4"))
        );
        assert_eq!(
            type_ref_field(&json!({"paymentType": "4"}), "paymentType", "paymentTypeId"),
            Some(SdId::new("4"))
        );
        assert_eq!(
            type_ref_field(&json!({"paymentTypeId": 4}), "paymentType", "paymentTypeId"),
            Some(SdId::new("4"))
        );
        assert_eq!(
            type_ref_field(&json!({}), "paymentType", "paymentTypeId"),
            None
        );
    }

    #[test]
    fn test_int_field() {
        let v = json!({"status": 4, "s": "5"});
        assert_eq!(int_field(&v, &["status"]), 4);
        assert_eq!(int_field(&v, &["s"]), 5);
        assert_eq!(int_field(&v, &["missing"]), 0);
    }

    #[test]
    fn test_array_field() {
        let v = json!({"lineItems": [1, 2]});
        assert_eq!(array_field(&v, &["products", "lineItems"]).len(), 2);
        assert!(array_field(&v, &["missing"]).is_empty());
    }
}
