//! InkRelay Core Library
//!
//! Action history and stroke erasure for the InkRelay collaborative drawing
//! server. Transport-agnostic: nothing here knows about sockets.

pub mod action;
pub mod eraser;
pub mod geometry;
pub mod store;

pub use action::{
    Action, ActionId, Attributes, Clear, DeleteStroke, EraseRequest, Image, PathPoint, Stroke,
};
pub use geometry::squared_distance;
pub use store::{ActionStore, StoreError, StoreResult};

pub use kurbo::Point;
