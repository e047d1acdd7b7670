use crate::typ::typed::TargetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Loops accept both `break` and `continue`.
    Loop,
    /// A switch only accepts `break`.
    Switch,
}

/// One enclosing breakable construct.
///
/// Frames live on the call stack of the checker: a construct builds its frame,
/// hands `frame.scope()` to the check of its body, and the frame is gone when
/// that call returns. Lookups only ever peek.
#[derive(Debug)]
pub struct LoopFrame<'a> {
    kind: FrameKind,
    target: TargetId,
    parent: LoopScope<'a>,
}

impl<'a> LoopFrame<'a> {
    pub fn new(kind: FrameKind, target: TargetId, parent: LoopScope<'a>) -> Self {
        Self { kind, target, parent }
    }

    pub fn scope(&self) -> LoopScope<'_> {
        LoopScope { top: Some(self) }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn target(&self) -> TargetId {
        self.target
    }
}

/// The chain of enclosing breakable constructs, innermost first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopScope<'a> {
    top: Option<&'a LoopFrame<'a>>,
}

impl<'a> LoopScope<'a> {
    pub fn root() -> Self {
        Self { top: None }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Innermost construct of any kind.
    pub fn break_target(&self) -> Option<TargetId> {
        self.top.map(|frame| frame.target)
    }

    /// Innermost loop; switches are skipped.
    pub fn continue_target(&self) -> Option<TargetId> {
        self.frames().find(|frame| frame.kind == FrameKind::Loop).map(|frame| frame.target)
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    pub fn frames(&self) -> impl Iterator<Item = &'a LoopFrame<'a>> + use<'a> {
        std::iter::successors(self.top, |frame| frame.parent.top)
    }
}
