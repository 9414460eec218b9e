//! Request semantics for lazyrest.
//!
//! Turns a method, a raw request path and an optional body into a [`Reply`]
//! against any [`DocumentStore`](lazyrest_store::DocumentStore). Nothing in
//! this crate knows about HTTP; the server and the CLI both drive the same
//! [`Dispatcher`].
//!
//! | Method   | Path form  | Success                          |
//! |----------|------------|----------------------------------|
//! | `GET`    | resource   | `200` document or collection     |
//! | `POST`   | collection | `201` `Created N items`          |
//! | `PUT`    | resource   | `202` empty                      |
//! | `DELETE` | resource   | `202` empty                      |
//! | other    | any        | `501` `Not Implemented`          |

pub mod dispatcher;
pub mod error;
pub mod identifier;
pub mod reply;
pub mod resolver;

pub use dispatcher::Dispatcher;
pub use error::{RestError, RestResult};
pub use identifier::{generate_id, prepare_batch, reconcile, ID_FIELD};
pub use reply::{Body, Method, Reply, Status};
pub use resolver::{resolve, Resolved};
