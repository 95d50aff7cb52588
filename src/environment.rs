//! Chained lexical frames.
//!
//! Frames are shared through [`EnvRef`] so that a closure created inside a
//! block keeps that block’s frame alive after the block has exited.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, mutable handle to a frame.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

fn undefined(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name.line, format!("Undefined variable '{}'.", name.lexeme))
}

impl<'a> Environment<'a> {
    /// A root frame (the globals).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a frame into a shareable handle.
    pub fn into_ref(self) -> EnvRef<'a> {
        Rc::new(RefCell::new(self))
    }

    /// Create or overwrite a binding in *this* frame.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        debug!("Defining '{}' = {}", name, value);

        self.values.insert(name, value);
    }

    /// Look a binding up in this frame only.
    pub fn get_local(&self, name: &str) -> Option<Value<'a>> {
        self.values.get(name).cloned()
    }

    /// Search this frame, then every enclosing one.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite an existing binding somewhere up the chain.  Never creates one.
    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }
}

/// The frame exactly `distance` enclosing links above `env`.
pub fn ancestor<'a>(env: &EnvRef<'a>, distance: usize) -> Option<EnvRef<'a>> {
    let mut frame: EnvRef<'a> = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef<'a> = Rc::clone(frame.borrow().enclosing.as_ref()?);
        frame = next;
    }

    Some(frame)
}

/// Read `name` from the frame `distance` hops up, without searching.
pub fn get_at<'a>(env: &EnvRef<'a>, distance: usize, name: &Token<'_>) -> Result<Value<'a>> {
    ancestor(env, distance)
        .and_then(|frame| frame.borrow().get_local(name.lexeme))
        .ok_or_else(|| undefined(name))
}

/// Overwrite `name` in the frame `distance` hops up, without searching.
pub fn assign_at<'a>(
    env: &EnvRef<'a>,
    distance: usize,
    name: &Token<'_>,
    value: Value<'a>,
) -> Result<()> {
    let frame: EnvRef<'a> = ancestor(env, distance).ok_or_else(|| undefined(name))?;
    let mut frame = frame.borrow_mut();

    match frame.values.get_mut(name.lexeme) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(undefined(name)),
    }
}
