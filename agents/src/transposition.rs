use chess9_core::{Move, PieceType, Square};
use std::sync::atomic::{AtomicU64, Ordering};

/// Type of node in the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Exact score (PV-node)
    Exact,
    /// Lower bound (fail-high node)
    LowerBound,
    /// Upper bound (fail-low node)
    UpperBound,
}

/// Entry in the transposition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionEntry {
    /// Zobrist hash of the position (for collision detection)
    pub hash: u64,
    /// Best move found at this position, without special-move metadata
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub node_type: NodeType,
    /// Search generation that wrote the entry
    pub age: u8,
}

// Second word layout:
// bits 0-6 from, 7-13 to, 14-17 promotion, 18 move present,
// 20-35 score, 36-43 depth, 44-45 node type, 46-53 age.
const MOVE_PRESENT: u64 = 1 << 18;
const SCORE_SHIFT: u32 = 20;
const DEPTH_SHIFT: u32 = 36;
const NODE_TYPE_SHIFT: u32 = 44;
const AGE_SHIFT: u32 = 46;
const SCORE_OFFSET: i32 = 32768;

/// Fixed-size hash table of search results, shared by reference within one search.
pub struct TranspositionTable {
    entries: Vec<AtomicU64>,
    /// Size mask (size must be power of 2)
    size_mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Creates a table using roughly `size_mb` megabytes (at least one entry).
    pub fn new(size_mb: usize) -> Self {
        // Each entry is 16 bytes (packed into 2 u64s)
        let entries_per_mb = (1024 * 1024) / 16;
        let num_entries = (size_mb * entries_per_mb).max(2);
        let size = num_entries.next_power_of_two() / 2;

        Self {
            entries: (0..size * 2).map(|_| AtomicU64::new(0)).collect(),
            size_mask: size - 1,
            generation: 0,
        }
    }

    /// Number of entry slots.
    pub fn capacity(&self) -> usize {
        self.size_mask + 1
    }

    pub fn store(&self, hash: u64, best_move: Option<Move>, score: i32, depth: u8, node_type: NodeType) {
        let index = self.slot(hash);
        let entry = TranspositionEntry {
            hash,
            best_move,
            score,
            depth,
            node_type,
            age: self.generation,
        };
        let (packed1, packed2) = pack_entry(&entry);

        self.entries[index].store(packed1, Ordering::Relaxed);
        self.entries[index + 1].store(packed2, Ordering::Relaxed);
    }

    /// Looks up a position, returning None on a miss or a hash collision.
    pub fn probe(&self, hash: u64) -> Option<TranspositionEntry> {
        let index = self.slot(hash);
        let packed1 = self.entries[index].load(Ordering::Relaxed);
        let packed2 = self.entries[index + 1].load(Ordering::Relaxed);

        if packed2 == 0 || packed1 != hash {
            return None;
        }
        Some(unpack_entry(packed1, packed2))
    }

    pub fn clear(&mut self) {
        for entry in &self.entries {
            entry.store(0, Ordering::Relaxed);
        }
        self.generation = 0;
    }

    /// Advances to the next search generation.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn slot(&self, hash: u64) -> usize {
        (hash as usize & self.size_mask) * 2
    }
}

fn pack_entry(entry: &TranspositionEntry) -> (u64, u64) {
    let mut packed2 = 0u64;

    if let Some(mv) = entry.best_move {
        let promo = mv.promotion.map_or(0, |p| p.index() as u64 + 1);
        packed2 |= mv.from.index() as u64 | (mv.to.index() as u64) << 7 | promo << 14 | MOVE_PRESENT;
    }

    let score = entry.score.clamp(-SCORE_OFFSET + 1, SCORE_OFFSET - 1);
    packed2 |= (((score + SCORE_OFFSET) as u64) & 0xFFFF) << SCORE_SHIFT;
    packed2 |= u64::from(entry.depth) << DEPTH_SHIFT;

    let node_type_bits = match entry.node_type {
        NodeType::Exact => 1,
        NodeType::LowerBound => 2,
        NodeType::UpperBound => 3,
    };
    packed2 |= node_type_bits << NODE_TYPE_SHIFT;
    packed2 |= u64::from(entry.age) << AGE_SHIFT;

    (entry.hash, packed2)
}

fn unpack_entry(packed1: u64, packed2: u64) -> TranspositionEntry {
    let best_move = if packed2 & MOVE_PRESENT != 0 {
        unpack_move(packed2)
    } else {
        None
    };

    let score = ((packed2 >> SCORE_SHIFT) & 0xFFFF) as i32 - SCORE_OFFSET;
    let depth = ((packed2 >> DEPTH_SHIFT) & 0xFF) as u8;
    let node_type = match (packed2 >> NODE_TYPE_SHIFT) & 0x3 {
        2 => NodeType::LowerBound,
        3 => NodeType::UpperBound,
        _ => NodeType::Exact,
    };
    let age = ((packed2 >> AGE_SHIFT) & 0xFF) as u8;

    TranspositionEntry {
        hash: packed1,
        best_move,
        score,
        depth,
        node_type,
        age,
    }
}

fn unpack_move(packed2: u64) -> Option<Move> {
    let from = Square::from_index((packed2 & 0x7F) as u8)?;
    let to = Square::from_index(((packed2 >> 7) & 0x7F) as u8)?;
    let promo = ((packed2 >> 14) & 0xF) as usize;

    Some(match promo.checked_sub(1).and_then(|i| PieceType::ALL.get(i)) {
        Some(&piece) => Move::new_promotion(from, to, piece),
        None => Move::new(from, to),
    })
}
