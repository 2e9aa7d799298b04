use std::{
	pin::Pin,
	task::{Context, Poll},
};

use futures_channel::mpsc;
use futures_lite::Stream;
use pin_project::pin_project;

use crate::{
	convert::FromRaw,
	stream::{Demand, Subscription, ValueStream},
};

/// Async face of a [`ValueStream`]: each delivered value becomes a stream
/// item.
///
/// The adapter holds unlimited demand, so no value is ever held back; a
/// burst of changes yields one item per change. Dropping the adapter
/// cancels the underlying [`Subscription`]. The stream never completes
/// while the adapter is alive.
#[pin_project]
#[must_use = "Streams do nothing unless polled."]
pub struct Values<V> {
	#[pin]
	receiver: mpsc::UnboundedReceiver<Option<V>>,
	_subscription: Subscription<V>,
}

impl<V: 'static + Clone + Send + FromRaw> ValueStream<V> {
	/// Subscribes with unlimited demand and exposes the deliveries as an
	/// async [`Stream`].
	pub fn into_values(self) -> Values<V> {
		let (sender, receiver) = mpsc::unbounded();
		let subscription = self.subscribe(move |value: Option<V>| {
			sender.unbounded_send(value).ok();
			Demand::NONE
		});
		subscription.request(Demand::UNLIMITED);
		Values {
			receiver,
			_subscription: subscription,
		}
	}
}

impl<V> Stream for Values<V> {
	type Item = Option<V>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.project().receiver.poll_next(cx)
	}
}
