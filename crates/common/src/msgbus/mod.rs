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

//! A process-local `MessageBus` for loosely coupled message passing.
//!
//! Supports topic-based publish/subscribe with single-segment wildcards,
//! point-to-point sends to registered endpoints, and request/response keyed by
//! correlation ID. Delivery is synchronous and in-order on the publisher's
//! thread; payloads are treated as immutable and never copied.

pub mod handler;

use std::{
    any::Any,
    cell::RefCell,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use handler::ShareableMessageHandler;
use indexmap::IndexMap;
use meridian_core::UUID4;
use meridian_model::identifiers::TraderId;
use ustr::Ustr;

/// The topic on which captured subscriber errors are published.
pub const ERROR_TOPIC: &str = "events.error";

/// An error captured from a panicking subscriber, republished on
/// [`ERROR_TOPIC`].
#[derive(Clone, Debug)]
pub struct BusError {
    /// The topic whose dispatch raised the error.
    pub topic: Ustr,
    /// The handler which raised.
    pub handler_id: Ustr,
    /// The captured panic message.
    pub message: String,
}

impl Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(topic={}, handler_id={}, message='{}')",
            stringify!(BusError),
            self.topic,
            self.handler_id,
            self.message,
        )
    }
}

/// Represents a subscription to a particular topic pattern.
///
/// Higher priority subscriptions receive messages first; ties break by
/// subscription insertion order. Assigning a priority is an advanced feature:
/// an inappropriate priority can deliver messages to a handler before core
/// components have processed them.
#[derive(Clone)]
pub struct Subscription {
    /// The shareable message handler for the subscription.
    pub handler: ShareableMessageHandler,
    /// A copy of the handler ID for faster equality checks.
    pub handler_id: Ustr,
    /// The topic pattern for the subscription.
    pub pattern: Ustr,
    /// The priority for the subscription.
    pub priority: u8,
}

impl Subscription {
    /// Creates a new [`Subscription`] instance.
    #[must_use]
    pub fn new<T: AsRef<str>>(
        pattern: T,
        handler: ShareableMessageHandler,
        priority: Option<u8>,
    ) -> Self {
        let handler_id = handler.id();
        Self {
            handler,
            handler_id,
            pattern: Ustr::from(pattern.as_ref()),
            priority: priority.unwrap_or(0),
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Subscription {{ pattern: {}, handler: {}, priority: {} }}",
            self.pattern, self.handler_id, self.priority
        )
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.handler_id == other.handler_id
    }
}

impl Eq for Subscription {}

impl Hash for Subscription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.handler_id.hash(state);
    }
}

/// Matches a dotted `topic` against a `pattern`.
///
/// A `*` segment matches exactly one topic segment; a trailing `**` segment
/// matches any remaining segments (including none).
#[must_use]
pub fn is_matching(topic: &Ustr, pattern: &Ustr) -> bool {
    let topic_segments: Vec<&str> = topic.split('.').collect();
    let pattern_segments: Vec<&str> = pattern.split('.').collect();

    for (i, segment) in pattern_segments.iter().enumerate() {
        if *segment == "**" && i == pattern_segments.len() - 1 {
            return topic_segments.len() >= i;
        }
        match topic_segments.get(i) {
            Some(topic_segment) if *segment == "*" || segment == topic_segment => {}
            _ => return false,
        }
    }
    topic_segments.len() == pattern_segments.len()
}

/// A process-local hub for publish/subscribe, point-to-point sends, and
/// request/response messaging.
pub struct MessageBus {
    /// The trader ID associated with the message bus.
    pub trader_id: TraderId,
    /// The instance ID associated with the message bus.
    pub instance_id: UUID4,
    /// The name for the message bus.
    pub name: String,
    subscriptions: IndexMap<Subscription, ()>,
    endpoints: IndexMap<Ustr, ShareableMessageHandler>,
    pending_responses: IndexMap<UUID4, ShareableMessageHandler>,
}

impl MessageBus {
    /// Creates a new [`MessageBus`] instance.
    #[must_use]
    pub fn new(trader_id: TraderId, instance_id: UUID4, name: Option<String>) -> Self {
        Self {
            trader_id,
            instance_id,
            name: name.unwrap_or_else(|| stringify!(MessageBus).to_owned()),
            subscriptions: IndexMap::new(),
            endpoints: IndexMap::new(),
            pending_responses: IndexMap::new(),
        }
    }

    /// Wraps the bus in a shared handle for single-threaded use.
    #[must_use]
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Subscribes the given `handler` to the topic `pattern`.
    ///
    /// Re-subscribing an identical (pattern, handler) pair is ignored with an
    /// error log.
    pub fn subscribe<T: AsRef<str>>(
        &mut self,
        pattern: T,
        handler: ShareableMessageHandler,
        priority: Option<u8>,
    ) {
        let sub = Subscription::new(pattern, handler, priority);
        if self.subscriptions.contains_key(&sub) {
            log::error!("{sub:?} already exists");
            return;
        }
        log::debug!("Subscribing {sub:?}");
        self.subscriptions.insert(sub, ());
    }

    /// Unsubscribes the given `handler` from the topic `pattern`.
    pub fn unsubscribe<T: AsRef<str>>(&mut self, pattern: T, handler: ShareableMessageHandler) {
        let sub = Subscription::new(pattern, handler, None);
        self.subscriptions.shift_remove(&sub);
    }

    /// Returns whether the given (pattern, handler) pair is subscribed.
    #[must_use]
    pub fn is_subscribed<T: AsRef<str>>(
        &self,
        pattern: T,
        handler: ShareableMessageHandler,
    ) -> bool {
        let sub = Subscription::new(pattern, handler, None);
        self.subscriptions.contains_key(&sub)
    }

    /// Returns the patterns for active subscriptions.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.subscriptions
            .keys()
            .map(|s| s.pattern.as_str())
            .collect()
    }

    /// Returns whether there are subscribers matching the given `topic`.
    #[must_use]
    pub fn has_subscribers<T: AsRef<str>>(&self, topic: T) -> bool {
        !self
            .matching_subscriptions(&Ustr::from(topic.as_ref()))
            .is_empty()
    }

    /// Returns the count of subscribers matching the given `topic`.
    #[must_use]
    pub fn subscriptions_count<T: AsRef<str>>(&self, topic: T) -> usize {
        self.matching_subscriptions(&Ustr::from(topic.as_ref()))
            .len()
    }

    /// Returns the subscriptions matching `topic` in delivery order
    /// (priority descending, ties by insertion order).
    #[must_use]
    pub fn matching_subscriptions(&self, topic: &Ustr) -> Vec<Subscription> {
        let mut matching: Vec<Subscription> = self
            .subscriptions
            .keys()
            .filter(|sub| is_matching(topic, &sub.pattern))
            .cloned()
            .collect();
        // Stable sort retains insertion order within equal priorities
        matching.sort_by(|a, b| b.priority.cmp(&a.priority));
        matching
    }

    /// Registers the given `handler` for the `endpoint` address, replacing any
    /// existing handler.
    pub fn register<T: AsRef<str>>(&mut self, endpoint: T, handler: ShareableMessageHandler) {
        log::debug!(
            "Registering endpoint '{}' with handler ID {}",
            endpoint.as_ref(),
            handler.id(),
        );
        self.endpoints
            .insert(Ustr::from(endpoint.as_ref()), handler);
    }

    /// Deregisters the handler for the `endpoint` address.
    pub fn deregister(&mut self, endpoint: &Ustr) {
        log::debug!("Deregistering endpoint '{endpoint}'");
        self.endpoints.shift_remove(endpoint);
    }

    /// Returns whether a handler is registered for the given `endpoint`.
    #[must_use]
    pub fn is_registered<T: AsRef<str>>(&self, endpoint: T) -> bool {
        self.endpoints.contains_key(&Ustr::from(endpoint.as_ref()))
    }

    /// Returns the handler for the given `endpoint`.
    #[must_use]
    pub fn get_endpoint<T: AsRef<str>>(&self, endpoint: T) -> Option<&ShareableMessageHandler> {
        self.endpoints.get(&Ustr::from(endpoint.as_ref()))
    }

    /// Returns the registered endpoint addresses.
    #[must_use]
    pub fn endpoints(&self) -> Vec<&str> {
        self.endpoints.keys().map(Ustr::as_str).collect()
    }

    /// Registers a pending response `callback`, returning the correlation ID.
    pub fn register_response_handler(&mut self, callback: ShareableMessageHandler) -> UUID4 {
        let correlation_id = UUID4::new();
        self.pending_responses.insert(correlation_id, callback);
        correlation_id
    }

    /// Takes the pending response handler for the given `correlation_id`.
    pub fn take_response_handler(
        &mut self,
        correlation_id: &UUID4,
    ) -> Option<ShareableMessageHandler> {
        self.pending_responses.shift_remove(correlation_id)
    }

    /// Returns the count of outstanding requests.
    #[must_use]
    pub fn pending_responses_count(&self) -> usize {
        self.pending_responses.len()
    }
}

impl Default for MessageBus {
    /// Creates a new default [`MessageBus`] instance.
    fn default() -> Self {
        Self::new(TraderId::default(), UUID4::new(), None)
    }
}

/// Publishes `message` to all subscribers matching `topic`.
///
/// Handlers run synchronously in priority order on the caller's thread. A
/// panicking handler does not abort delivery to the remaining subscribers: the
/// panic is captured, logged, and republished as a [`BusError`] on
/// [`ERROR_TOPIC`].
pub fn publish(msgbus: &Rc<RefCell<MessageBus>>, topic: &Ustr, message: &dyn Any) {
    log::trace!("Publishing topic '{topic}'");
    let matching_subs = msgbus.borrow().matching_subscriptions(topic);

    for sub in matching_subs {
        if topic.as_str() == ERROR_TOPIC {
            // Never capture recursively on the error topic itself
            sub.handler.0.handle(message);
            continue;
        }
        let result = catch_unwind(AssertUnwindSafe(|| sub.handler.0.handle(message)));
        if let Err(panic) = result {
            let panic_msg = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!(
                "Handler {} panicked on topic '{topic}': {panic_msg}",
                sub.handler_id
            );
            let error = BusError {
                topic: *topic,
                handler_id: sub.handler_id,
                message: panic_msg,
            };
            publish(msgbus, &Ustr::from(ERROR_TOPIC), &error as &dyn Any);
        }
    }
}

/// Sends `message` point-to-point to the handler registered for `endpoint`.
pub fn send(msgbus: &Rc<RefCell<MessageBus>>, endpoint: &Ustr, message: &dyn Any) {
    let handler = msgbus.borrow().get_endpoint(endpoint).cloned();
    match handler {
        Some(handler) => handler.0.handle(message),
        None => log::error!("No registered endpoint '{endpoint}'"),
    }
}

/// Sends a request `message` to `endpoint`, registering `callback` for the
/// response. Returns the correlation ID tying the response to this request.
pub fn request(
    msgbus: &Rc<RefCell<MessageBus>>,
    endpoint: &Ustr,
    message: &dyn Any,
    callback: ShareableMessageHandler,
) -> UUID4 {
    let correlation_id = msgbus.borrow_mut().register_response_handler(callback);
    send(msgbus, endpoint, message);
    correlation_id
}

/// Routes a response `message` to the pending callback registered under
/// `correlation_id`.
pub fn respond(msgbus: &Rc<RefCell<MessageBus>>, correlation_id: &UUID4, message: &dyn Any) {
    let handler = msgbus.borrow_mut().take_response_handler(correlation_id);
    match handler {
        Some(handler) => handler.0.handle(message),
        None => log::error!("No pending request for correlation ID {correlation_id}"),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rstest::rstest;

    use super::{handler::TypedMessageHandler, *};

    fn recording_handler(
        log: Rc<RefCell<Vec<String>>>,
        id: &str,
    ) -> ShareableMessageHandler {
        let id_string = id.to_string();
        ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some(id),
            move |msg: &String| {
                log.borrow_mut().push(format!("{id_string}:{msg}"));
            },
        )))
    }

    #[rstest]
    #[case("data.quotes.AUD/USD.SIM", "data.quotes.AUD/USD.SIM", true)]
    #[case("data.quotes.AUD/USD.SIM", "data.quotes.*.*", true)]
    #[case("data.quotes.AUD/USD.SIM", "data.*.AUD/USD.SIM", true)]
    #[case("data.quotes.AUD/USD.SIM", "data.trades.*.*", false)]
    #[case("data.quotes.AUD/USD.SIM", "data.quotes.*", false)] // segment count differs
    #[case("data.quotes.AUD/USD.SIM", "data.**", true)]
    #[case("events.order.S-001.AUD/USD.SIM", "events.order.S-001.**", true)]
    #[case("events.order.S-001.AUD/USD.SIM", "events.order.S-002.**", false)]
    #[case("data", "**", true)]
    #[case("a.b", "a.b.c", false)]
    fn test_is_matching(#[case] topic: &str, #[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(
            is_matching(&Ustr::from(topic), &Ustr::from(pattern)),
            expected
        );
    }

    #[rstest]
    fn test_subscribe_and_publish() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();
        msgbus
            .borrow_mut()
            .subscribe("data.quotes.*.*", recording_handler(log.clone(), "h1"), None);

        publish(
            &msgbus,
            &Ustr::from("data.quotes.AUD/USD.SIM"),
            &"quote".to_string() as &dyn Any,
        );
        assert_eq!(*log.borrow(), vec!["h1:quote".to_string()]);
    }

    #[rstest]
    fn test_publish_priority_ordering() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();
        {
            let mut bus = msgbus.borrow_mut();
            bus.subscribe("topic", recording_handler(log.clone(), "low1"), None);
            bus.subscribe("topic", recording_handler(log.clone(), "high"), Some(10));
            bus.subscribe("topic", recording_handler(log.clone(), "low2"), None);
        }

        publish(&msgbus, &Ustr::from("topic"), &"m".to_string() as &dyn Any);
        assert_eq!(
            *log.borrow(),
            vec![
                "high:m".to_string(),
                "low1:m".to_string(),
                "low2:m".to_string(),
            ]
        );
    }

    #[rstest]
    fn test_publish_in_order_per_topic() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();
        msgbus
            .borrow_mut()
            .subscribe("topic", recording_handler(log.clone(), "h"), None);

        for i in 0..5 {
            publish(&msgbus, &Ustr::from("topic"), &format!("{i}") as &dyn Any);
        }
        assert_eq!(
            *log.borrow(),
            vec!["h:0", "h:1", "h:2", "h:3", "h:4"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<String>>()
        );
    }

    #[rstest]
    fn test_unsubscribe() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();
        let handler = recording_handler(log.clone(), "h1");
        msgbus.borrow_mut().subscribe("topic", handler.clone(), None);
        msgbus.borrow_mut().unsubscribe("topic", handler);

        publish(&msgbus, &Ustr::from("topic"), &"m".to_string() as &dyn Any);
        assert!(log.borrow().is_empty());
        assert!(!msgbus.borrow().has_subscribers("topic"));
    }

    #[rstest]
    fn test_panicking_handler_does_not_abort_delivery() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let errors: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();

        let panicking = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some("panicking"),
            |_: &String| panic!("handler exploded"),
        )));
        let errors_clone = errors.clone();
        let error_handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some("errors"),
            move |error: &BusError| {
                errors_clone.borrow_mut().push(error.message.clone());
            },
        )));
        {
            let mut bus = msgbus.borrow_mut();
            bus.subscribe("topic", panicking, Some(1));
            bus.subscribe("topic", recording_handler(log.clone(), "h2"), None);
            bus.subscribe(ERROR_TOPIC, error_handler, None);
        }

        publish(&msgbus, &Ustr::from("topic"), &"m".to_string() as &dyn Any);

        // The later subscriber still received the message
        assert_eq!(*log.borrow(), vec!["h2:m".to_string()]);
        // The panic surfaced as an event on the error topic
        assert_eq!(*errors.borrow(), vec!["handler exploded".to_string()]);
    }

    #[rstest]
    fn test_endpoint_send() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();
        msgbus
            .borrow_mut()
            .register("DataEngine.execute", recording_handler(log.clone(), "h"));

        send(
            &msgbus,
            &Ustr::from("DataEngine.execute"),
            &"cmd".to_string() as &dyn Any,
        );
        assert_eq!(*log.borrow(), vec!["h:cmd".to_string()]);

        msgbus
            .borrow_mut()
            .deregister(&Ustr::from("DataEngine.execute"));
        assert!(!msgbus.borrow().is_registered("DataEngine.execute"));
    }

    #[rstest]
    fn test_request_response_round_trip() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let msgbus = MessageBus::default().into_shared();
        msgbus
            .borrow_mut()
            .register("Responder", recording_handler(log.clone(), "req"));

        let correlation_id = request(
            &msgbus,
            &Ustr::from("Responder"),
            &"ping".to_string() as &dyn Any,
            recording_handler(log.clone(), "resp"),
        );
        assert_eq!(msgbus.borrow().pending_responses_count(), 1);

        respond(&msgbus, &correlation_id, &"pong".to_string() as &dyn Any);
        assert_eq!(
            *log.borrow(),
            vec!["req:ping".to_string(), "resp:pong".to_string()]
        );
        assert_eq!(msgbus.borrow().pending_responses_count(), 0);

        // Responding twice on the same correlation ID is a no-op
        respond(&msgbus, &correlation_id, &"pong".to_string() as &dyn Any);
        assert_eq!(log.borrow().len(), 2);
    }
}
