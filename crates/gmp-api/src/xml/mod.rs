// XML response-transform pipeline
//
// Raw body → parsed `<envelope>` → protocol metadata + payload element
// tree, with the fixed entity decoding applied uniformly to attribute
// values and text nodes along the way.

mod decode;
mod element;
mod envelope;

pub use decode::{decode, encode};
pub use element::Element;
pub use envelope::{Envelope, ResponseMeta, extract_rejection_message, parse_envelope};
