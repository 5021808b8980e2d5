use crate::cache::store::ValueType;
use bytes::{BufMut, BytesMut};

pub fn from_string(val: &str) -> ValueType {
    let mut value = BytesMut::with_capacity(val.len());
    value.put_slice(val.as_bytes());
    value.freeze()
}
