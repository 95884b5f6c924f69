// Typed result of one protocol call.

use crate::xml::ResponseMeta;

/// Success value of a command: the typed payload plus the envelope
/// metadata that accompanied it. Constructed once per request and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T> Response<T> {
    pub fn new(data: T, meta: ResponseMeta) -> Self {
        Self { data, meta }
    }

    /// Map the payload, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: f(self.data),
            meta: self.meta,
        }
    }
}
