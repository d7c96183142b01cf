//! Session-scoped reactive store shared by every view of one chart.
//!
//! Each field is a [`Signal`]: a value cell with an explicit subscriber
//! list. `set` stores the value and then calls every subscriber
//! synchronously, so observers always see a value after its single writer
//! has published it.

use crate::ui::click_mode::ClickMode;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Box<dyn FnMut(&T)>;

struct SignalInner<T> {
    value: T,
    version: u64,
    next_id: u64,
    subscribers: SmallVec<[(SubscriptionId, Subscriber<T>); 4]>,
}

pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                next_id: 0,
                subscribers: SmallVec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrowing read for values too large to clone on every access.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    #[inline(always)]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Edits the value in place, then notifies like `set`.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut inner = self.inner.borrow_mut();
            f(&mut inner.value);
            inner.version += 1;
        }
        self.notify();
    }

    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(f)));
        id
    }

    /// Returns false when `id` was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        // Subscribers run without any borrow held so they may read this
        // signal or write other signals. Ones added meanwhile are kept.
        let (value, mut subscribers) = {
            let mut inner = self.inner.borrow_mut();
            (inner.value.clone(), std::mem::take(&mut inner.subscribers))
        };
        for (_, f) in &mut subscribers {
            f(&value);
        }
        let mut inner = self.inner.borrow_mut();
        let added = std::mem::replace(&mut inner.subscribers, subscribers);
        inner.subscribers.extend(added);
    }
}

pub struct ViewState {
    /// Vertical offset of the note field scroll surface, in canvas pixels.
    pub scroll_y: Signal<f32>,
    /// Pixels per second of the active chart.
    pub time_scale: Signal<f32>,
    pub viewport_height: Signal<f32>,
    pub click_mode: Signal<ClickMode>,
    /// Missed timestamps. Repeats are allowed: two missed notes on one row
    /// appear twice.
    pub miss_times: Signal<Vec<f64>>,
}

impl ViewState {
    pub fn new(viewport_height: f32, click_mode: ClickMode) -> Self {
        Self {
            scroll_y: Signal::new(0.0),
            time_scale: Signal::new(0.0),
            viewport_height: Signal::new(viewport_height),
            click_mode: Signal::new(click_mode),
            miss_times: Signal::new(Vec::new()),
        }
    }

    pub fn add_miss(&self, time: f64) {
        self.miss_times.update(|m| m.push(time));
    }

    /// Drops one occurrence of `time`. Returns false if it was not present.
    pub fn remove_miss(&self, time: f64) -> bool {
        let present = self.miss_times.with(|m| m.contains(&time));
        if present {
            self.miss_times.update(|m| {
                if let Some(ix) = m.iter().position(|&t| t == time) {
                    m.remove(ix);
                }
            });
        }
        present
    }

    /// Misses as shown to the user: one per distinct time.
    pub fn unique_miss_count(&self) -> usize {
        self.miss_times.with(|m| {
            let mut sorted = m.clone();
            sorted.sort_by(f64::total_cmp);
            sorted.dedup();
            sorted.len()
        })
    }
}
