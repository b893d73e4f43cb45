use std::net::IpAddr;

use crate::{Key, NetmatchError, Result, key, parse_network};

/// Longest prefix length accepted by `Trie::add` and `Trie::remove`.
pub const MAX_PREFIX_LEN: u8 = 126;

const ROOT: usize = 0;

/// Binary prefix tree with one level per key bit. The root is the zero
/// length match and is never pruned.
#[derive(Clone)]
pub struct Trie<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    count: usize,
}

#[derive(Clone)]
struct Node<T> {
    value: Option<T>,
    left: Option<usize>,
    right: Option<usize>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            value: None,
            left: None,
            right: None,
        }
    }
}

impl<T> Node<T> {
    fn is_dead(&self) -> bool {
        self.value.is_none() && self.left.is_none() && self.right.is_none()
    }
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            free: Vec::new(),
            count: 0,
        }
    }
}

fn check_length(length: u8) -> Result<()> {
    if length > MAX_PREFIX_LEN {
        tracing::debug!("rejected prefix length {}", length);
        return Err(NetmatchError::InvalidLength { length });
    }
    Ok(())
}

impl<T> Trie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate room for `nodes` tree nodes, the root included.
    pub fn with_capacity(nodes: usize) -> Self {
        let mut trie = Self::default();
        trie.nodes.reserve(nodes.saturating_sub(1));
        trie
    }

    /// Number of registered networks.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[ROOT] = Node::default();
        self.free.clear();
        self.count = 0;
    }

    #[inline(always)]
    fn get_child(&self, index: usize, bit: bool) -> Option<usize> {
        if bit {
            self.nodes[index].right
        } else {
            self.nodes[index].left
        }
    }

    #[inline(always)]
    fn set_child(&mut self, index: usize, child: usize, bit: bool) {
        if bit {
            self.nodes[index].right = Some(child);
        } else {
            self.nodes[index].left = Some(child);
        }
    }

    #[inline(always)]
    fn clear_child(&mut self, index: usize, bit: bool) -> Option<usize> {
        if bit {
            self.nodes[index].right.take()
        } else {
            self.nodes[index].left.take()
        }
    }

    fn new_node(&mut self) -> usize {
        if let Some(index) = self.free.pop() {
            self.nodes[index] = Node::default();
            index
        } else {
            self.nodes.push(Node::default());
            self.nodes.len() - 1
        }
    }

    /// Register `value` for the first `length` bits of `key`.
    pub fn add(&mut self, key: &Key, length: u8, value: T) -> Result<()> {
        check_length(length)?;

        let mut index = ROOT;
        for bit in 0..length {
            let bit = key.is_bit_set(bit);
            index = match self.get_child(index, bit) {
                Some(child) => child,
                None => {
                    let child = self.new_node();
                    self.set_child(index, child, bit);
                    child
                }
            };
        }

        let node = &mut self.nodes[index];
        if node.value.is_some() {
            tracing::debug!("add {}/{}: already present", key, length);
            return Err(NetmatchError::already_present(key, length));
        }
        node.value = Some(value);
        self.count += 1;
        tracing::debug!("add {}/{}", key, length);
        Ok(())
    }

    /// Longest prefix match. Returns the value of the deepest registered
    /// prefix containing `key`.
    pub fn lookup(&self, key: &Key) -> Option<&T> {
        let mut index = ROOT;
        let mut matched = self.nodes[ROOT].value.as_ref();
        for bit in 0..=MAX_PREFIX_LEN {
            match self.get_child(index, key.is_bit_set(bit)) {
                Some(child) => index = child,
                None => break,
            }
            if let Some(value) = self.nodes[index].value.as_ref() {
                matched = Some(value);
            }
        }
        matched
    }

    /// Exact match of `key`/`length` without falling back to shorter prefixes.
    pub fn get(&self, key: &Key, length: u8) -> Option<&T> {
        if length > MAX_PREFIX_LEN {
            return None;
        }
        let mut index = ROOT;
        for bit in 0..length {
            index = self.get_child(index, key.is_bit_set(bit))?;
        }
        self.nodes[index].value.as_ref()
    }

    /// Unregister `key`/`length` and return its value. Nodes left without a
    /// value or children are pruned on the way back to the root.
    pub fn remove(&mut self, key: &Key, length: u8) -> Result<T> {
        check_length(length)?;

        let mut path = Vec::with_capacity(length as usize);
        let mut index = ROOT;
        for bit in 0..length {
            let bit = key.is_bit_set(bit);
            match self.get_child(index, bit) {
                Some(child) => {
                    path.push((index, bit));
                    index = child;
                }
                None => {
                    tracing::debug!("remove {}/{}: not contained", key, length);
                    return Err(NetmatchError::not_contained(key, length));
                }
            }
        }

        let Some(value) = self.nodes[index].value.take() else {
            tracing::debug!("remove {}/{}: not contained", key, length);
            return Err(NetmatchError::not_contained(key, length));
        };
        self.count -= 1;

        let mut pruned = 0;
        while let Some((parent, bit)) = path.pop() {
            if !self.nodes[index].is_dead() {
                break;
            }
            self.clear_child(parent, bit);
            self.free.push(index);
            pruned += 1;
            index = parent;
        }
        tracing::debug!("remove {}/{}: pruned {} nodes", key, length, pruned);
        Ok(value)
    }

    pub fn add_network(&mut self, network: &str, value: T) -> Result<()> {
        let (key, length) = parse_network(network)?;
        self.add(&key, length, value)
    }

    pub fn remove_network(&mut self, network: &str) -> Result<T> {
        let (key, length) = parse_network(network)?;
        self.remove(&key, length)
    }

    pub fn lookup_addr(&self, addr: impl Into<IpAddr>) -> Option<&T> {
        self.lookup(&key(addr))
    }
}
