use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runtime::value::{Procedure, Value};

/// Handle to a binding frame stored in an [`Environment`]
///
/// Handles are plain indices, so a closure capturing the frame that also
/// binds the closure forms no ownership cycle. The generation detects use of
/// a handle whose frame has been reclaimed and whose slot was reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId {
    index: u32,
    generation: u32,
}

/// Single binding frame
#[derive(Default)]
struct Frame {
    /// Variables defined in this frame
    bindings: HashMap<Rc<str>, Value>,
    /// Lexical parent (None for the top-level frame)
    parent: Option<FrameId>,
}

struct Slot {
    generation: u32,
    frame: Option<Frame>,
    marked: bool,
}

/// Arena of binding frames
///
/// Frames are parent-linked: lookup walks from a frame outward through its
/// ancestors. Frames are reclaimed only by [`Environment::collect`], a
/// mark-and-sweep pass from explicit roots.
#[derive(Default)]
pub struct Environment {
    slots: Vec<Slot>,
    free: Vec<u32>,
    allocated_since_collect: usize,
}

impl Environment {
    /// Creates an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new frame with the given lexical parent
    pub fn new_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        self.allocated_since_collect += 1;
        let frame = Frame {
            bindings: HashMap::new(),
            parent,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.frame = Some(frame);
            return FrameId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            frame: Some(frame),
            marked: false,
        });
        FrameId {
            index,
            generation: 0,
        }
    }

    fn frame(&self, id: FrameId) -> Result<&Frame> {
        match self.slots.get(id.index as usize) {
            Some(slot) if slot.generation == id.generation => slot
                .frame
                .as_ref()
                .ok_or_else(|| stale_frame(id)),
            _ => Err(stale_frame(id)),
        }
    }

    fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame> {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation => {
                slot.frame.as_mut().ok_or_else(|| stale_frame(id))
            }
            _ => Err(stale_frame(id)),
        }
    }

    /// Inserts or overwrites a binding in `frame` only
    pub fn define(&mut self, frame: FrameId, name: impl Into<Rc<str>>, value: Value) -> Result<()> {
        self.frame_mut(frame)?.bindings.insert(name.into(), value);
        Ok(())
    }

    /// Finds the nearest binding of `name`, walking outward from `frame`
    pub fn lookup(&self, frame: FrameId, name: &str) -> Result<Value> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = self.frame(id)?;
            if let Some(value) = frame.bindings.get(name) {
                return Ok(value.clone());
            }
            current = frame.parent;
        }
        Err(Error::UnboundVariable {
            name: name.to_string(),
        })
    }

    /// Replaces the nearest existing binding of `name`; never creates one
    pub fn assign(&mut self, frame: FrameId, name: &str, value: Value) -> Result<()> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = self.frame_mut(id)?;
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return Ok(());
            }
            current = frame.parent;
        }
        Err(Error::UnboundVariable {
            name: name.to_string(),
        })
    }

    /// Checks whether `name` is visible from `frame`
    pub fn is_bound(&self, frame: FrameId, name: &str) -> bool {
        self.lookup(frame, name).is_ok()
    }

    /// Lexical parent of a frame
    pub fn parent(&self, frame: FrameId) -> Result<Option<FrameId>> {
        Ok(self.frame(frame)?.parent)
    }

    /// Returns all bindings visible from `frame`, nearer bindings shadowing farther ones
    pub fn snapshot(&self, frame: FrameId) -> Result<HashMap<String, Value>> {
        let mut result = HashMap::new();
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = self.frame(id)?;
            for (name, value) in &frame.bindings {
                result
                    .entry(name.to_string())
                    .or_insert_with(|| value.clone());
            }
            current = frame.parent;
        }
        Ok(result)
    }

    /// Number of frames currently allocated
    pub fn live_frames(&self) -> usize {
        self.slots.iter().filter(|slot| slot.frame.is_some()).count()
    }

    /// Number of frames allocated since the last collection
    pub fn allocated_since_collect(&self) -> usize {
        self.allocated_since_collect
    }

    /// Reclaims every frame not reachable from `roots` or from `values`
    ///
    /// Reachability follows frame parents, the values bound in each frame,
    /// and closures found inside those values (including inside pairs).
    /// Returns the number of frames freed.
    pub fn collect<'a>(
        &mut self,
        roots: impl IntoIterator<Item = FrameId>,
        values: impl IntoIterator<Item = &'a Value>,
    ) -> usize {
        let mut frames: Vec<FrameId> = roots.into_iter().collect();
        let mut pending: Vec<Value> = values.into_iter().cloned().collect();

        // Mark
        loop {
            if let Some(value) = pending.pop() {
                match &value {
                    Value::Pair(pair) => {
                        pending.push(pair.head.clone());
                        pending.push(pair.tail.clone());
                    }
                    Value::Procedure(procedure) => {
                        if let Procedure::Lambda(lambda) = procedure.as_ref() {
                            frames.push(lambda.env);
                        }
                    }
                    _ => {}
                }
                continue;
            }

            let Some(id) = frames.pop() else {
                break;
            };
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation || slot.marked {
                continue;
            }
            slot.marked = true;
            if let Some(frame) = &slot.frame {
                frames.extend(frame.parent);
                pending.extend(frame.bindings.values().cloned());
            }
        }

        // Sweep
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.marked {
                slot.marked = false;
            } else if slot.frame.is_some() {
                slot.frame = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }

        self.allocated_since_collect = 0;
        freed
    }
}

fn stale_frame(id: FrameId) -> Error {
    Error::runtime(format!(
        "environment frame {}#{} is no longer live",
        id.index, id.generation
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_define_and_lookup() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        env.define(global, "x", Value::Number(42)).unwrap();

        assert_eq!(env.lookup(global, "x").unwrap(), Value::Number(42));
    }

    #[test]
    fn test_unbound_variable() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        let err = env.lookup(global, "undefined").unwrap_err();
        assert_eq!(
            err,
            Error::UnboundVariable {
                name: "undefined".to_string()
            }
        );
    }

    #[test]
    fn test_shadowing() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        env.define(global, "x", Value::Number(10)).unwrap();

        let inner = env.new_frame(Some(global));
        env.define(inner, "x", Value::string("shadowed")).unwrap();
        env.define(inner, "y", Value::Number(30)).unwrap();

        assert_eq!(env.lookup(inner, "x").unwrap(), Value::string("shadowed"));
        assert_eq!(env.lookup(global, "x").unwrap(), Value::Number(10));
        assert!(env.lookup(global, "y").is_err());
    }

    #[test]
    fn test_assign_updates_nearest_existing_binding() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        env.define(global, "x", Value::Number(1)).unwrap();
        let inner = env.new_frame(Some(global));

        env.assign(inner, "x", Value::Number(2)).unwrap();
        assert_eq!(env.lookup(global, "x").unwrap(), Value::Number(2));
        assert!(env.snapshot(inner).unwrap().contains_key("x"));
    }

    #[test]
    fn test_assign_never_creates() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        assert!(env.assign(global, "nope", Value::Number(1)).is_err());
        assert!(!env.is_bound(global, "nope"));
    }

    #[test]
    fn test_collect_frees_unreachable_frames() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        let _garbage = env.new_frame(Some(global));
        let kept = env.new_frame(Some(global));
        let closure = Value::lambda(Value::Null, Value::Null, kept);
        env.define(global, "f", closure).unwrap();

        assert_eq!(env.live_frames(), 3);
        let freed = env.collect([global], []);
        assert_eq!(freed, 1);
        assert_eq!(env.live_frames(), 2);
        assert!(env.parent(kept).is_ok());
    }

    #[test]
    fn test_collect_handles_closure_cycles() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        let local = env.new_frame(Some(global));
        // The frame binds a closure that captures the same frame.
        let closure = Value::lambda(Value::Null, Value::Null, local);
        env.define(local, "self-ref", closure).unwrap();

        assert_eq!(env.collect([global], []), 1);
        assert_eq!(env.live_frames(), 1);
    }

    #[test]
    fn test_stale_handle_is_detected_after_reuse() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        let dead = env.new_frame(Some(global));
        env.collect([global], []);

        let reused = env.new_frame(Some(global));
        assert_ne!(dead, reused);
        assert!(env.lookup(dead, "x").is_err());
        assert!(env.define(dead, "x", Value::Number(1)).is_err());
    }

    #[test]
    fn test_values_root_their_frames() {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        let captured = env.new_frame(Some(global));
        let closure = Value::lambda(Value::Null, Value::Null, captured);
        let in_list = Value::list(vec![Value::Number(1), closure]);

        assert_eq!(env.collect([global], [&in_list]), 0);
        assert_eq!(env.live_frames(), 2);
    }
}
