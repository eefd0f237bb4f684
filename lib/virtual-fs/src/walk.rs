use std::collections::btree_map;

use crate::{Directory, Node, VirtualPath};

/// Depth-first iterator over every entry in a [`FileSystem`](crate::FileSystem).
///
/// Directories are yielded before their children and siblings are visited in
/// name order. The root itself is not yielded.
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(VirtualPath, btree_map::Iter<'a, String, Node>)>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(root: &'a Directory) -> Self {
        Walk {
            stack: vec![(VirtualPath::root(), root.children.iter())],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (VirtualPath, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (parent, children) = self.stack.last_mut()?;

            let Some((name, node)) = children.next() else {
                self.stack.pop();
                continue;
            };

            let path = parent.child(name);

            if let Node::Directory(dir) = node {
                self.stack.push((path.clone(), dir.children.iter()));
            }

            return Some((path, node));
        }
    }
}
