// gmp-api: Async Rust client for the Greenbone Management Protocol (GMP)
// as exposed over HTTP by the gsad gateway.
//
// The layers, bottom up: `filter` (the paging/sorting/search query
// language), `xml` (envelope parsing and entity decoding), `model` (the
// typed-entity parsing convention), `http` (the transport with session
// token and error-handler chain), `command` (CRUD verbs mapped onto GMP
// command names), and `counts` (pagination bookkeeping).

pub mod command;
pub mod counts;
pub mod error;
pub mod filter;
pub mod http;
pub mod model;
pub mod transport;
pub mod xml;

pub use command::{EntitiesCommand, EntityCommand, EntityList, Response};
pub use counts::CollectionCounts;
pub use error::{Error, RejectReason};
pub use filter::{Filter, FilterTerm, Relation};
pub use http::{GmpHttp, Params};
pub use model::Model;
pub use transport::{TlsMode, TransportConfig};
