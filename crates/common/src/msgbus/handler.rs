// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Message handlers for the message bus.
//!
//! Handlers process `&dyn Any` payloads; `TypedMessageHandler` downcasts to a
//! concrete message type and logs an error on a type mismatch.

use std::{
    any::{Any, type_name},
    fmt::Debug,
    marker::PhantomData,
    rc::Rc,
};

use meridian_core::UUID4;
use ustr::Ustr;

/// A handler for messages published or sent on the bus.
pub trait MessageHandler: Any {
    /// Returns the unique identifier for this handler.
    fn id(&self) -> Ustr;
    /// Handles a message of any type.
    fn handle(&self, message: &dyn Any);
}

/// A message handler which downcasts payloads to a concrete type.
pub struct TypedMessageHandler<T: 'static + ?Sized, F: Fn(&T) + 'static> {
    id: Ustr,
    callback: F,
    _phantom: PhantomData<T>,
}

impl<T: 'static, F: Fn(&T) + 'static> TypedMessageHandler<T, F> {
    /// Creates a new handler with an optional custom ID.
    pub fn new<S: AsRef<str>>(id: Option<S>, callback: F) -> Self {
        let id = id.map_or_else(
            || generate_handler_id(&callback),
            |s| Ustr::from(s.as_ref()),
        );
        Self {
            id,
            callback,
            _phantom: PhantomData,
        }
    }

    /// Creates a new handler with an auto-generated ID.
    pub fn from(callback: F) -> Self {
        Self::new::<Ustr>(None, callback)
    }
}

impl<T: 'static, F: Fn(&T) + 'static> MessageHandler for TypedMessageHandler<T, F> {
    fn id(&self) -> Ustr {
        self.id
    }

    fn handle(&self, message: &dyn Any) {
        if let Some(typed) = message.downcast_ref::<T>() {
            (self.callback)(typed);
        } else {
            log::error!("Expected message of type {}", type_name::<T>());
        }
    }
}

fn generate_handler_id<T: 'static + ?Sized, F: 'static + Fn(&T)>(callback: &F) -> Ustr {
    let callback_ptr = std::ptr::from_ref(callback);
    let uuid = UUID4::new();
    Ustr::from(&format!("<{callback_ptr:?}>-{uuid}"))
}

/// A shareable handle to a message handler.
///
/// Contains `Rc<dyn MessageHandler>` which is intentionally not `Send`/`Sync`:
/// handlers run on the publisher's thread within a single-threaded kernel.
#[repr(transparent)]
#[derive(Clone)]
pub struct ShareableMessageHandler(pub Rc<dyn MessageHandler>);

impl ShareableMessageHandler {
    /// Returns the unique identifier for the handler.
    #[must_use]
    pub fn id(&self) -> Ustr {
        self.0.id()
    }
}

impl Debug for ShareableMessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ShareableMessageHandler))
            .field("id", &self.0.id())
            .finish()
    }
}

impl From<Rc<dyn MessageHandler>> for ShareableMessageHandler {
    fn from(value: Rc<dyn MessageHandler>) -> Self {
        Self(value)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_typed_handler_downcasts() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let received_clone = received.clone();
        let handler = TypedMessageHandler::from(move |msg: &String| {
            received_clone.borrow_mut().push(msg.clone());
        });

        handler.handle(&"hello".to_string() as &dyn Any);
        assert_eq!(*received.borrow(), vec!["hello".to_string()]);
    }

    #[rstest]
    fn test_typed_handler_ignores_mismatched_type() {
        let received = Rc::new(RefCell::new(0_usize));
        let received_clone = received.clone();
        let handler = TypedMessageHandler::from(move |_: &String| {
            *received_clone.borrow_mut() += 1;
        });

        handler.handle(&42_u64 as &dyn Any);
        assert_eq!(*received.borrow(), 0);
    }

    #[rstest]
    fn test_custom_handler_id() {
        let handler = TypedMessageHandler::new(Some("my-handler"), |_: &String| {});
        assert_eq!(handler.id(), Ustr::from("my-handler"));
    }
}
