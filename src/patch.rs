//! Path-addressed reads and copy-on-write updates of a cached [`WireMap`] tree.
//!
//! [`set_at_path`] never touches its input. It works on a shallow copy of the root and
//! un-shares ([`Rc::make_mut`]) only the nodes on the addressed path, so every other subtree
//! of the result is pointer-identical to the corresponding subtree of the input.

use std::rc::Rc;

use parse_display::Display;

use crate::{
    event::TreeUpdate,
    path::{AccessPath, Segment},
    wire::{WireKind, WireMap, WireValue},
};

#[cfg(test)]
mod tests;

#[derive(Display, Debug, Clone, PartialEq)]
pub enum ResolutionFailure {
    #[display("key not found")]
    KeyNotFound,
    #[display("index out of bounds (len: {len})")]
    IndexOutOfBounds { len: usize },
    #[display("`{tag}` node is not a container")]
    NotAContainer { tag: String },
}

#[derive(Display, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[display("empty access path")]
    EmptyPath,
    /// A segment could not be resolved. `position` is the segment's index in the path.
    #[display("cannot resolve `{segment}` (segment {position}) in `{path}`: {failure}")]
    Resolution {
        path: String,
        segment: String,
        position: usize,
        failure: ResolutionFailure,
    },
    /// The terminal index is more than one past the end of its sequence.
    #[display("index {index} is past the append position (len: {len}) in `{path}`")]
    CreationOverflow {
        path: String,
        index: usize,
        len: usize,
    },
}

impl std::error::Error for PatchError {}

pub type PatchResult<T> = Result<T, PatchError>;

/// Returns the node at `path`.
pub fn get_at_path<'a>(root: &'a WireMap, path: &str) -> PatchResult<&'a Rc<WireValue>> {
    let parsed = AccessPath::parse(path);
    let Some((last, init)) = parsed.segments().split_last() else {
        return Err(PatchError::EmptyPath);
    };
    let ctx = Ctx { path };
    let mut container = Container::Map(root);
    for (position, seg) in init.iter().enumerate() {
        let node = container.child(seg, position, &ctx)?;
        container = Container::of(node, seg, position, &ctx)?;
    }
    container.child(last, init.len(), &ctx)
}

/// Returns a new root in which the node at `path` has been replaced by `value`.
///
/// The last segment may name a member that does not exist yet, or the append position of a
/// sequence; every other segment must resolve to an existing container node.
pub fn set_at_path(root: &WireMap, path: &str, value: WireValue) -> PatchResult<WireMap> {
    let parsed = AccessPath::parse(path);
    if parsed.is_empty() {
        return Err(PatchError::EmptyPath);
    }
    let mut new_root = root.clone();
    let ctx = Ctx { path };
    set_in(
        ContainerMut::Map(&mut new_root),
        parsed.segments(),
        0,
        value,
        &ctx,
    )?;
    log::debug!("patched `{path}`");
    Ok(new_root)
}

/// Applies a tree update pushed by the backend.
pub fn apply_tree_update(root: &WireMap, update: &TreeUpdate) -> PatchResult<WireMap> {
    set_at_path(root, &update.full_access_path, update.value.clone())
}

struct Ctx<'a> {
    path: &'a str,
}
impl Ctx<'_> {
    fn resolution(&self, seg: &Segment, position: usize, failure: ResolutionFailure) -> PatchError {
        PatchError::Resolution {
            path: self.path.to_owned(),
            segment: seg.to_string(),
            position,
            failure,
        }
    }
}

#[derive(Clone, Copy)]
enum Container<'a> {
    Map(&'a WireMap),
    Seq(&'a [Rc<WireValue>]),
}

impl<'a> Container<'a> {
    fn of(node: &'a WireValue, seg: &Segment, position: usize, ctx: &Ctx) -> PatchResult<Self> {
        match &node.kind {
            WireKind::Dict(members) | WireKind::Service { members, .. } => {
                Ok(Container::Map(members))
            }
            WireKind::List(items) => Ok(Container::Seq(items)),
            _ => Err(ctx.resolution(
                seg,
                position,
                ResolutionFailure::NotAContainer { tag: node.tag() },
            )),
        }
    }

    fn child(&self, seg: &Segment, position: usize, ctx: &Ctx) -> PatchResult<&'a Rc<WireValue>> {
        match *self {
            Container::Map(map) => map
                .get(&seg.as_key())
                .ok_or_else(|| ctx.resolution(seg, position, ResolutionFailure::KeyNotFound)),
            Container::Seq(items) => {
                let Some(index) = seg.as_index() else {
                    return Err(ctx.resolution(seg, position, ResolutionFailure::KeyNotFound));
                };
                items.get(index).ok_or_else(|| {
                    ctx.resolution(
                        seg,
                        position,
                        ResolutionFailure::IndexOutOfBounds { len: items.len() },
                    )
                })
            }
        }
    }
}

enum ContainerMut<'a> {
    Map(&'a mut WireMap),
    Seq(&'a mut Vec<Rc<WireValue>>),
}

impl<'a> ContainerMut<'a> {
    fn of(
        node: &'a mut WireValue,
        seg: &Segment,
        position: usize,
        ctx: &Ctx,
    ) -> PatchResult<Self> {
        let tag = node.tag();
        match &mut node.kind {
            WireKind::Dict(members) | WireKind::Service { members, .. } => {
                Ok(ContainerMut::Map(members))
            }
            WireKind::List(items) => Ok(ContainerMut::Seq(items)),
            _ => Err(ctx.resolution(seg, position, ResolutionFailure::NotAContainer { tag })),
        }
    }

    fn child(
        self,
        seg: &Segment,
        position: usize,
        ctx: &Ctx,
    ) -> PatchResult<&'a mut Rc<WireValue>> {
        match self {
            ContainerMut::Map(map) => map
                .get_mut(&seg.as_key())
                .ok_or_else(|| ctx.resolution(seg, position, ResolutionFailure::KeyNotFound)),
            ContainerMut::Seq(items) => {
                let Some(index) = seg.as_index() else {
                    return Err(ctx.resolution(seg, position, ResolutionFailure::KeyNotFound));
                };
                let len = items.len();
                items.get_mut(index).ok_or_else(|| {
                    ctx.resolution(seg, position, ResolutionFailure::IndexOutOfBounds { len })
                })
            }
        }
    }

    fn child_or_create(
        self,
        seg: &Segment,
        position: usize,
        ctx: &Ctx,
    ) -> PatchResult<&'a mut Rc<WireValue>> {
        match self {
            ContainerMut::Map(map) => Ok(map
                .entry(seg.as_key())
                .or_insert_with(|| Rc::new(WireValue::placeholder(ctx.path)))),
            ContainerMut::Seq(items) => {
                let Some(index) = seg.as_index() else {
                    return Err(ctx.resolution(seg, position, ResolutionFailure::KeyNotFound));
                };
                let len = items.len();
                if index > len {
                    return Err(PatchError::CreationOverflow {
                        path: ctx.path.to_owned(),
                        index,
                        len,
                    });
                }
                if index == len {
                    items.push(Rc::new(WireValue::placeholder(ctx.path)));
                }
                Ok(&mut items[index])
            }
        }
    }
}

fn set_in(
    container: ContainerMut<'_>,
    segments: &[Segment],
    position: usize,
    value: WireValue,
    ctx: &Ctx,
) -> PatchResult<()> {
    match segments {
        [] => Err(PatchError::EmptyPath),
        [last] => {
            let slot = container.child_or_create(last, position, ctx)?;
            *slot = Rc::new(value);
            Ok(())
        }
        [seg, rest @ ..] => {
            let slot = container.child(seg, position, ctx)?;
            let node = Rc::make_mut(slot);
            let inner = ContainerMut::of(node, seg, position, ctx)?;
            set_in(inner, rest, position + 1, value, ctx)
        }
    }
}
