use std::{
    fmt,
    fmt::{Debug, Display},
};

const MASK_CHARS: usize = 3;

#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// A diagnostic form of the secret showing only the first and last three characters, e.g. `abc...xyz`.
    ///
    /// Values that are too short to mask without giving most of them away are fully masked.
    pub fn masked(&self) -> String {
        let chars = self.value.chars().collect::<Vec<char>>();
        if chars.len() < MASK_CHARS * 3 {
            return "****".to_string();
        }
        let prefix = chars[..MASK_CHARS].iter().collect::<String>();
        let suffix = chars[chars.len() - MASK_CHARS..].iter().collect::<String>();
        format!("{prefix}...{suffix}")
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
