/// Answers whether the current process may touch root-owned system state.
pub trait Privilege {
    fn is_elevated(&self) -> bool;
}

impl<F> Privilege for F
where
    F: Fn() -> bool,
{
    fn is_elevated(&self) -> bool {
        self()
    }
}

/// Effective uid check.
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectiveUid;

#[cfg(target_os = "linux")]
impl Privilege for EffectiveUid {
    fn is_elevated(&self) -> bool {
        nix::unistd::Uid::effective().is_root()
    }
}

#[cfg(not(target_os = "linux"))]
impl Privilege for EffectiveUid {
    fn is_elevated(&self) -> bool {
        false
    }
}
