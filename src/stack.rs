use alloc::{
    format,
    string::{String, ToString as _},
    vec::Vec,
};
use core::cell::RefCell;

/// Entry of a build stack: a type under construction or a scalar producer being run
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Type(String),
    Scalar(String),
}

impl Frame {
    fn label(&self) -> String {
        match self {
            Frame::Type(name) => name.to_string(),
            Frame::Scalar(name) => format!("scalar {name}"),
        }
    }
}

/// Names under construction in one resolution, the index of a frame is its depth
#[derive(Default)]
pub(crate) struct BuildStack {
    frames: RefCell<Vec<Frame>>,
}

impl BuildStack {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, frame: &Frame) -> bool {
        self.frames.borrow().contains(frame)
    }

    #[inline]
    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Pushes a frame, it's popped when the returned guard is dropped
    #[inline]
    #[must_use]
    pub(crate) fn push(&self, frame: Frame) -> FrameGuard<'_> {
        let mut frames = self.frames.borrow_mut();
        let depth = frames.len();
        frames.push(frame);

        FrameGuard { stack: self, depth }
    }

    /// Labels of the frames, shallowest first
    #[must_use]
    pub(crate) fn chain(&self) -> Vec<String> {
        self.frames.borrow().iter().map(Frame::label).collect()
    }
}

pub(crate) struct FrameGuard<'a> {
    stack: &'a BuildStack,
    depth: usize,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.frames.borrow_mut().truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildStack, Frame};

    use alloc::{string::String, vec};

    fn ty(name: &str) -> Frame {
        Frame::Type(String::from(name))
    }

    #[test]
    fn test_push_and_pop() {
        let stack = BuildStack::new();
        {
            let _car = stack.push(ty("Car"));
            {
                let _engine = stack.push(ty("ElectricEngine"));

                assert_eq!(stack.depth(), 2);
                assert!(stack.contains(&ty("Car")));
                assert_eq!(stack.chain(), vec!["Car", "ElectricEngine"]);
            }
            assert_eq!(stack.depth(), 1);
            assert!(!stack.contains(&ty("ElectricEngine")));
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_scalar_frames_are_separate() {
        let stack = BuildStack::new();
        let _speed = stack.push(Frame::Scalar(String::from("speed")));

        assert!(!stack.contains(&ty("speed")));
        assert_eq!(stack.chain(), vec!["scalar speed"]);
    }

    #[test]
    fn test_pop_on_early_return() {
        fn fails(stack: &BuildStack) -> Result<(), ()> {
            let _frame = stack.push(ty("MissingArgument"));
            Err(())
        }

        let stack = BuildStack::new();

        assert!(fails(&stack).is_err());
        assert_eq!(stack.depth(), 0);
    }
}
