//! 路径的分解
//!
//! 路径由`/`分隔成若干项，连续的`/`视作一个。
//! 以`/`开头的是绝对路径，从根目录开始解析；否则从当前目录开始解析。

use crate::config::MAX_NAME;

pub trait Path {
    fn is_absolute(&self) -> bool;

    /// 跳过开头的`/`，返回`(下一项, 余下的路径)`；路径已耗尽时返回`None`。
    ///
    /// 余下的路径不以`/`开头，为空说明这是最后一项。
    /// 超过 [`MAX_NAME`] 的项会被截断。
    fn next_component(&self) -> Option<(&Self, &Self)>;

    fn is_relative(&self) -> bool {
        !self.is_absolute()
    }
}

impl Path for str {
    #[inline]
    fn is_absolute(&self) -> bool {
        self.starts_with('/')
    }

    fn next_component(&self) -> Option<(&Self, &Self)> {
        let path = self.trim_start_matches('/');
        if path.is_empty() {
            return None;
        }

        let (name, rest) = path.split_once('/').unwrap_or((path, ""));
        Some((truncate_name(name), rest.trim_start_matches('/')))
    }
}

/// 把名字截断到 [`MAX_NAME`] 字节以内，不会切开一个字符
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME {
        return name;
    }

    let mut end = MAX_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn next_component_skips_separators() {
        assert_eq!("//a//b/".next_component(), Some(("a", "b/")));
        assert_eq!("b/".next_component(), Some(("b", "")));
        assert_eq!("/".next_component(), None);
        assert_eq!("".next_component(), None);
    }

    #[test]
    fn walk_components() {
        let mut cmps = Vec::new();
        let mut rest = "/usr//bin/./ls";
        while let Some((name, next)) = rest.next_component() {
            cmps.push(name);
            rest = next;
        }
        assert_eq!(cmps, ["usr", "bin", ".", "ls"]);
        assert!("usr/bin".is_relative());
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let (name, rest) = long.next_component().unwrap();
        assert_eq!(name.len(), MAX_NAME);
        assert_eq!(rest, "");

        // 多字节字符不会被切开
        let wide = "文件名文件名文件名文件名";
        assert!(truncate_name(wide).len() <= MAX_NAME);
        assert_eq!(truncate_name(wide), "文件名文件名文件名");
    }
}
