pub mod attacks;
pub mod board;
pub mod error;
pub mod game_state;
pub mod layout;
pub mod move_gen;
pub mod notation;
pub mod perft;
pub mod pieces;
pub mod shape;
pub mod types;
pub mod zobrist;

pub use board::*;
pub use error::{CoreError, CoreResult};
pub use game_state::*;
pub use layout::{positions, LayoutError};
pub use move_gen::*;
pub use notation::{move_notation, parse_square, square_name, NotationError};
pub use perft::{perft, perft_detailed, perft_divide, PerftResults};
pub use pieces::{Movement, PieceRules};
pub use shape::BoardShape;
pub use types::*;
pub use zobrist::ZOBRIST;
