//! Children reconciliation.
//!
//! # Keyed lists
//!
//! 1. Patch the common prefix: entries whose keys match at the same offset
//!    from the start.
//! 2. Patch the common suffix, walking back from both ends.
//! 3. If only new entries remain, mount them. If only old entries remain,
//!    unmount them.
//! 4. Otherwise map each remaining old key to its index, patch every new entry
//!    whose key is found and record the old index it came from. Old entries
//!    nobody claimed are unmounted.
//! 5. If the recorded old indices ever decrease, some nodes must move. The
//!    longest increasing subsequence of the recorded indices is the largest
//!    set of nodes already in the right relative order; walking the new range
//!    back to front, everything outside it is moved (or mounted, for new
//!    entries) before its right neighbour.
//!
//! The number of moves issued in step 5 is the minimum possible.

use std::collections::HashMap;

use tracing::trace;

use super::lis::longest_increasing_subsequence;
use super::{NodeHandle, Renderer};
use crate::error::Result;
use crate::vnode::{Children, Key, VNode};

impl Renderer {
    /// Diff the children of `prev` into `next`. New nodes are inserted into
    /// `container` before `anchor`.
    pub(crate) fn patch_children(
        &self,
        prev: &mut VNode,
        next: &mut VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        let host = self.host();
        match (&mut prev.children, &mut next.children) {
            (Children::Nodes(old), Children::Text(text)) => {
                for child in old.iter_mut() {
                    self.unmount(child, true);
                }
                host.set_element_text(container, text);
            }
            (Children::Text(old), Children::Text(text)) => {
                if old != text {
                    host.set_element_text(container, text);
                }
            }
            (_, Children::Text(text)) => host.set_element_text(container, text),

            (Children::Nodes(old), Children::Nodes(new)) => {
                let keyed = matches!(
                    (old.first(), new.first()),
                    (Some(a), Some(b)) if a.key.is_some() && b.key.is_some()
                );
                if keyed {
                    self.patch_keyed_children(old, new, container, anchor)?;
                } else {
                    self.patch_unkeyed_children(old, new, container, anchor)?;
                }
            }
            (Children::Text(_), Children::Nodes(new)) => {
                host.set_element_text(container, "");
                self.mount_children(new, container, anchor)?;
            }
            (Children::None, Children::Nodes(new)) => self.mount_children(new, container, anchor)?,

            (Children::Nodes(old), Children::None) => {
                for child in old.iter_mut() {
                    self.unmount(child, true);
                }
            }
            (Children::Text(_), Children::None) => host.set_element_text(container, ""),
            (Children::None, Children::None) => {}
        }
        Ok(())
    }

    pub(crate) fn mount_children(
        &self,
        nodes: &mut [VNode],
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        for node in nodes {
            self.patch(None, node, container, anchor)?;
        }
        Ok(())
    }

    fn patch_unkeyed_children(
        &self,
        old: &mut [VNode],
        new: &mut [VNode],
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        let common = old.len().min(new.len());
        for (prev, next) in old.iter_mut().zip(new.iter_mut()) {
            self.patch(Some(prev), next, container, anchor)?;
        }

        if old.len() > common {
            for prev in &mut old[common..] {
                self.unmount(prev, true);
            }
        } else if new.len() > common {
            self.mount_children(&mut new[common..], container, anchor)?;
        }
        Ok(())
    }

    fn patch_keyed_children(
        &self,
        old: &mut [VNode],
        new: &mut [VNode],
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) -> Result<()> {
        let mut start = 0;
        let mut old_end = old.len();
        let mut new_end = new.len();

        // 1. common prefix
        while start < old_end && start < new_end && old[start].key == new[start].key {
            self.patch(Some(&mut old[start]), &mut new[start], container, anchor)?;
            start += 1;
        }

        // 2. common suffix
        while start < old_end && start < new_end && old[old_end - 1].key == new[new_end - 1].key {
            self.patch(Some(&mut old[old_end - 1]), &mut new[new_end - 1], container, anchor)?;
            old_end -= 1;
            new_end -= 1;
        }

        // 3. only insertions or only removals left
        if start >= old_end {
            for j in (start..new_end).rev() {
                let before = self.anchor_after(new, j, anchor);
                self.patch(None, &mut new[j], container, before)?;
            }
            return Ok(());
        }
        if start >= new_end {
            for prev in &mut old[start..old_end] {
                self.unmount(prev, true);
            }
            return Ok(());
        }

        // 4. unknown middle range
        let old_index: HashMap<Key, usize> = (start..old_end)
            .filter_map(|i| old[i].key.clone().map(|key| (key, i)))
            .collect();

        let mut sources: Vec<Option<usize>> = vec![None; new_end - start];
        let mut claimed = vec![false; old_end - start];
        let mut moved = false;
        let mut max_old = 0;

        for j in start..new_end {
            let found = new[j].key.as_ref().and_then(|key| old_index.get(key)).copied();
            let Some(i) = found else {
                continue;
            };
            if claimed[i - start] {
                continue;
            }
            self.patch(Some(&mut old[i]), &mut new[j], container, anchor)?;
            claimed[i - start] = true;
            sources[j - start] = Some(i);
            if i < max_old {
                moved = true;
            } else {
                max_old = i;
            }
        }

        for (offset, taken) in claimed.iter().enumerate() {
            if !taken {
                self.unmount(&mut old[start + offset], true);
            }
        }

        // 5. move and mount
        let stable = if moved {
            longest_increasing_subsequence(&sources)
        } else {
            Vec::new()
        };
        let mut cursor = stable.len();
        let mut moves = 0usize;

        for offset in (0..sources.len()).rev() {
            let j = start + offset;
            let before = self.anchor_after(new, j, anchor);
            match sources[offset] {
                None => self.patch(None, &mut new[j], container, before)?,
                Some(_) if moved => {
                    if cursor > 0 && stable[cursor - 1] == offset {
                        cursor -= 1;
                    } else {
                        self.move_node(&new[j], container, before);
                        moves += 1;
                    }
                }
                Some(_) => {}
            }
        }

        trace!(
            range = sources.len(),
            stable = stable.len(),
            moves,
            "keyed diff"
        );
        Ok(())
    }

    /// Host node right after `nodes[index]`, or `fallback` at the end.
    fn anchor_after(&self, nodes: &[VNode], index: usize, fallback: Option<NodeHandle>) -> Option<NodeHandle> {
        match nodes.get(index + 1) {
            Some(next) => self.first_host_node(next),
            None => fallback,
        }
    }
}
