use std::sync::Arc;

use super::{commands::Action, update::Update};

pub type Predicate = Arc<dyn Fn(&Update) -> bool + Send + Sync>;

/// A standing follow-up: fires for every update that satisfies all predicates.
#[derive(Clone)]
pub struct ReplySpec {
    pub predicates: Vec<Predicate>,
    pub action: Action<Update>,
}

impl ReplySpec {
    pub fn new(action: Action<Update>, predicates: Vec<Predicate>) -> Self {
        ReplySpec { predicates, action }
    }

    /// Predicates run in order and stop at the first `false`.
    pub fn is_ok_for(&self, update: &Update) -> bool {
        self.predicates.iter().all(|predicate| predicate(update))
    }
}

#[derive(Clone, Default)]
pub struct ReplyRegistry {
    replies: Vec<ReplySpec>,
}

impl ReplyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, reply: ReplySpec) {
        self.replies.push(reply);
    }

    /// First reply, in registration order, whose predicates all hold.
    pub fn find_match(&self, update: &Update) -> Option<&ReplySpec> {
        self.replies.iter().find(|reply| reply.is_ok_for(update))
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

pub fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&Update) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn has_text() -> Predicate {
    predicate(|update| update.text.is_some())
}

pub fn has_photo() -> Predicate {
    predicate(Update::has_photo)
}

pub fn text_starts_with(prefix: &str) -> Predicate {
    let prefix = prefix.to_owned();
    predicate(move |update| {
        update
            .text()
            .is_some_and(|text| text.starts_with(prefix.as_str()))
    })
}

/// Sender's first name, ASCII case-insensitive.
pub fn first_name_is(name: &str) -> Predicate {
    let name = name.to_owned();
    predicate(move |update| {
        update
            .from
            .as_ref()
            .is_some_and(|user| user.first_name.eq_ignore_ascii_case(&name))
    })
}
