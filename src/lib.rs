//! Viewlist - index-addressable lists with live sub-range views.
//!
//! Two engines share one API through the [`Sequence`] trait:
//!
//! - [`ArrayList`], a contiguous ring buffer with O(1) access by index.
//! - [`LinkedList`], a doubly linked list whose nodes carry order tags, so
//!   views can tell where an edit landed without walking the list.
//!
//! Either engine can be hashed ([`Indexing::Hashed`]), which turns the list
//! into an ordered set with constant-time membership.
//!
//! A view is a handle ([`ViewId`]) to a contiguous range of its list. Views
//! follow edits made through the list or through any other view: inserting
//! before a view shifts it, inserting inside grows it, removing from it
//! shrinks it. Reordering a range that cuts through a view invalidates the
//! view instead.
//!
//! # Quick Start
//!
//! ```
//! use viewlist::{ArrayList, Sequence};
//!
//! let mut list: ArrayList<char> = "abcdef".chars().collect();
//! let id = list.view(2, 2).unwrap();
//!
//! // Edits through the root list move the view along.
//! list.insert(0, 'x').unwrap();
//! assert_eq!(list.view_offset(id), Ok(3));
//!
//! // Edits through the view are relative to it.
//! let mut window = list.window(id).unwrap();
//! window.push_back('y').unwrap();
//! assert_eq!(window.to_vec(), vec!['c', 'd', 'y']);
//! assert_eq!(list.iter().collect::<String>(), "xabcdyef");
//! ```

pub mod array;
pub mod config;
pub mod equality;
pub mod error;
pub mod event;
mod hash_index;
pub mod linked;
mod order;
pub mod sequence;
pub mod view;

pub use array::ArrayList;
pub use config::{Config, Indexing};
pub use equality::{ByKey, Equality, FnEquality, Natural};
pub use error::{Error, ErrorKind, Result};
pub use event::{Event, Listener};
pub use linked::LinkedList;
pub use sequence::{Cursor, Root, Sequence, Window};
pub use view::{ViewId, ViewState};

#[doc(hidden)]
pub use sequence::Backing;
#[doc(hidden)]
pub use view::Scope;
