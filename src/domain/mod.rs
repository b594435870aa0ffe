//! Domain layer: plain records and the pure rules that govern them.
//!
//! Nothing in here performs I/O. Stores load records, hand them to these
//! rules inside a transaction and persist the result.

pub mod comment;
pub mod compilation;
pub mod event;
pub mod filter;
pub mod hit;
pub mod request;
pub mod search;
pub mod time;
pub mod user;

pub use comment::{Comment, CommentDraft, CommentStatus};
pub use compilation::{Compilation, CompilationPatch, NewCompilation};
pub use event::{
    AdminStateAction, Event, EventDraft, EventPatch, EventState, NewEvent, OwnerStateAction,
    Resolved,
};
pub use filter::{Page, Predicate};
pub use hit::{EndpointHit, NewHit, StatsQuery, ViewStats};
pub use request::{ParticipationRequest, RequestStatus, StatusUpdate, StatusUpdateOutcome};
pub use time::{Clock, FixedClock, SystemClock};
pub use user::{Category, Coordinates, Location, NewUser, User, UserShort};
