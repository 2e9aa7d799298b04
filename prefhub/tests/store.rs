use std::sync::Arc;

use prefhub::{Change, ChangeSource, Raw, Store, Value, WatchOptions};

use _validator::Validator;

fn recording(v: &Arc<Validator<Change>>) -> prefhub::WatchCallback {
	let v = Arc::clone(v);
	Arc::new(move |change: &Change| v.push(change.clone()))
}

#[test]
fn get_set_remove() {
	let store = Store::new();
	assert_eq!(store.get("volume"), None);

	store.set("volume", Value::Int(11));
	assert_eq!(store.get("volume"), Some(Value::Int(11)));

	store.set("volume", Value::Str("loud".into()));
	assert_eq!(store.get("volume"), Some(Value::Str("loud".into())));

	store.remove("volume");
	assert_eq!(store.get("volume"), None);
}

#[test]
fn clones_share_state() {
	let store = Store::new();
	let alias = store.clone();

	alias.set("theme", Value::from("dark"));
	assert_eq!(store.get("theme"), Some(Value::Str("dark".into())));
}

#[test]
fn notifies_with_requested_slots() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	store.register(
		"theme",
		WatchOptions::OLD | WatchOptions::NEW,
		recording(&v),
	);

	store.set("theme", Value::from("dark"));
	store.set("theme", Value::from("light"));
	store.remove("theme");

	v.expect([
		Change {
			key: "theme".into(),
			old: Some(Raw::Absent),
			new: Some(Raw::Present(Value::Str("dark".into()))),
		},
		Change {
			key: "theme".into(),
			old: Some(Raw::Present(Value::Str("dark".into()))),
			new: Some(Raw::Present(Value::Str("light".into()))),
		},
		Change {
			key: "theme".into(),
			old: Some(Raw::Present(Value::Str("light".into()))),
			new: Some(Raw::Absent),
		},
	]);
}

#[test]
fn initial_delivery_carries_current_state() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	store.set("volume", Value::Int(3));

	store.register(
		"volume",
		WatchOptions::INITIAL | WatchOptions::NEW,
		recording(&v),
	);

	v.expect([Change {
		key: "volume".into(),
		old: None,
		new: Some(Raw::Present(Value::Int(3))),
	}]);
}

#[test]
fn initial_delivery_of_unset_key_is_absent() {
	let v = Arc::new(Validator::new());
	let store = Store::new();

	store.register(
		"volume",
		WatchOptions::INITIAL | WatchOptions::NEW,
		recording(&v),
	);

	v.expect([Change {
		key: "volume".into(),
		old: None,
		new: Some(Raw::Absent),
	}]);
}

#[test]
fn initial_without_new_leaves_slot_unpopulated() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	store.set("volume", Value::Int(3));

	store.register("volume", WatchOptions::INITIAL, recording(&v));

	v.expect([Change {
		key: "volume".into(),
		old: None,
		new: None,
	}]);
}

#[test]
fn other_keys_do_not_notify() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	store.register("theme", WatchOptions::NEW, recording(&v));

	store.set("volume", Value::Int(1));

	v.expect([]);
}

#[test]
fn unregister_stops_delivery_and_is_idempotent() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	let token = store.register("theme", WatchOptions::NEW, recording(&v));
	assert_eq!(store.watcher_count("theme"), 1);

	store.unregister(token);
	store.unregister(token);
	assert_eq!(store.watcher_count("theme"), 0);

	store.set("theme", Value::from("dark"));
	v.expect([]);
}

#[test]
fn watchers_notify_in_registration_order() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	for tag in [1, 2, 3] {
		let v = Arc::clone(&v);
		store.register(
			"theme",
			WatchOptions::empty(),
			Arc::new(move |_: &Change| v.push(tag)),
		);
	}

	store.set("theme", Value::from("dark"));

	v.expect([1, 2, 3]);
}

#[test]
fn callbacks_may_reenter_the_store() {
	let v = Arc::new(Validator::new());
	let store = Store::new();
	store.register("theme", WatchOptions::NEW, {
		let v = Arc::clone(&v);
		let store = store.clone();
		Arc::new(move |change: &Change| {
			v.push(change.new.clone());
			if store.get("echo").is_none() {
				store.set("echo", Value::Bool(true));
			}
		})
	});

	store.set("theme", Value::from("dark"));

	assert_eq!(store.get("echo"), Some(Value::Bool(true)));
	v.expect([Some(Raw::Present(Value::Str("dark".into())))]);
}

#[test]
fn concurrent_writers_to_one_key_never_overlap_or_reorder() {
	let store = Store::new();
	let log = Arc::new(std::sync::Mutex::new(Vec::new()));
	store.register("counter", WatchOptions::NEW, {
		let log = Arc::clone(&log);
		Arc::new(move |change: &Change| log.lock().unwrap().push(change.new.clone()))
	});

	let writers: Vec<_> = [0_i64, 1]
		.into_iter()
		.map(|tag| {
			std::thread::spawn({
				let store = store.clone();
				move || {
					for step in 0..50 {
						store.set("counter", Value::Int(tag * 1000 + step));
					}
				}
			})
		})
		.collect();
	for writer in writers {
		writer.join().unwrap();
	}

	let log = log.lock().unwrap();
	assert_eq!(log.len(), 100);
	// However the writers interleave, each one's own values must arrive
	// in the order it applied them.
	for tag in [0_i64, 1] {
		let applied: Vec<i64> = log
			.iter()
			.filter_map(|slot| match slot {
				Some(Raw::Present(Value::Int(code))) if code / 1000 == tag => Some(*code),
				_ => None,
			})
			.collect();
		assert_eq!(applied.len(), 50);
		assert!(applied.windows(2).all(|pair| pair[0] < pair[1]));
	}
}

#[test]
#[should_panic = "can't observe the empty key"]
fn observing_the_empty_key_is_fatal() {
	let store = Store::new();
	store.register("", WatchOptions::NEW, Arc::new(|_| ()));
}
