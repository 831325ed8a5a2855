use crate::prelude::*;

use enum_iterator::Sequence;

/// The six faces, in the order the move and facelet indices use. A facelet's color is named after
/// the face whose center carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum Face {
    Up,
    Right,
    Front,
    Down,
    Left,
    Back,
}

impl Face {
    pub fn all() -> impl Iterator<Item = Face> {
        enum_iterator::all()
    }

    pub fn from_index(i: usize) -> Face {
        [
            Face::Up,
            Face::Right,
            Face::Front,
            Face::Down,
            Face::Left,
            Face::Back,
        ][i]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Face {
        Face::from_index((self.index() + 3) % 6)
    }

    pub fn letter(self) -> char {
        match self {
            Face::Up => 'U',
            Face::Right => 'R',
            Face::Front => 'F',
            Face::Down => 'D',
            Face::Left => 'L',
            Face::Back => 'B',
        }
    }

    pub fn from_letter(c: char) -> Option<Face> {
        Some(match c.to_ascii_uppercase() {
            'U' => Face::Up,
            'R' => Face::Right,
            'F' => Face::Front,
            'D' => Face::Down,
            'L' => Face::Left,
            'B' => Face::Back,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum Direction {
    Single,
    Double,
    Reverse,
}

impl Direction {
    fn from_index(i: usize) -> Direction {
        [Direction::Single, Direction::Double, Direction::Reverse][i]
    }

    pub fn inverse(self) -> Direction {
        match self {
            Direction::Single => Direction::Reverse,
            Direction::Double => Direction::Double,
            Direction::Reverse => Direction::Single,
        }
    }
}

/// One of the 18 face turns. Its table index is `3 * face + direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    pub face: Face,
    pub direction: Direction,
}

impl Move {
    /// The moves that keep the cube inside the phase-2 subgroup: any U or D turn, half turns
    /// elsewhere.
    pub const PHASE2: [Move; N_PHASE2_MOVE] = [
        Move::new(Face::Up, Direction::Single),
        Move::new(Face::Up, Direction::Double),
        Move::new(Face::Up, Direction::Reverse),
        Move::new(Face::Right, Direction::Double),
        Move::new(Face::Front, Direction::Double),
        Move::new(Face::Down, Direction::Single),
        Move::new(Face::Down, Direction::Double),
        Move::new(Face::Down, Direction::Reverse),
        Move::new(Face::Left, Direction::Double),
        Move::new(Face::Back, Direction::Double),
    ];

    pub const fn new(face: Face, direction: Direction) -> Move {
        Move { face, direction }
    }

    pub fn all() -> impl Iterator<Item = Move> {
        (0..N_MOVE).map(Move::from_index)
    }

    pub fn from_index(i: usize) -> Move {
        Move {
            face: Face::from_index(i / 3),
            direction: Direction::from_index(i % 3),
        }
    }

    pub fn index(self) -> usize {
        3 * self.face as usize + self.direction as usize
    }

    pub fn inverse(self) -> Move {
        Move {
            face: self.face,
            direction: self.direction.inverse(),
        }
    }

    pub fn is_phase2(self) -> bool {
        matches!(self.face, Face::Up | Face::Down) || self.direction == Direction::Double
    }

    /// Whether `self` may directly follow `previous` in a canonical sequence. Turns of the same
    /// face never follow each other, and of two opposite faces only the U, R, F one may come first.
    pub fn could_follow(&self, previous: &Move) -> bool {
        let diff = previous.face.index() as isize - self.face.index() as isize;
        diff != 0 && diff != 3
    }

    /// Parses whitespace separated moves. Both `R'` and `R3` are accepted for a reverse turn.
    pub fn parse_sequence(s: &str) -> anyhow::Result<Vec<Move>> {
        s.split_whitespace().map(|s| s.parse()).collect()
    }

    pub fn invert_sequence(moves: &[Move]) -> Vec<Move> {
        moves.iter().rev().map(|m| m.inverse()).collect()
    }

    pub fn format_sequence(moves: &[Move]) -> String {
        moves
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl core::fmt::Display for Move {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let suffix = match self.direction {
            Direction::Single => "",
            Direction::Double => "2",
            Direction::Reverse => "'",
        };
        write!(f, "{}{}", self.face.letter(), suffix)
    }
}

impl core::str::FromStr for Move {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Move> {
        let mut chars = s.chars();
        let face_char = match chars.next() {
            Some(c) => c,
            None => return Err(anyhow::anyhow!("No face for move")),
        };

        let face = match Face::from_letter(face_char) {
            Some(f) => f,
            None => return Err(anyhow::anyhow!("Unrecognized face {}", face_char)),
        };

        let direction = match chars.next() {
            None | Some('1') => Direction::Single,
            Some('\'') | Some('3') => Direction::Reverse,
            Some('2') => Direction::Double,
            Some(c) => return Err(anyhow::anyhow!("Unrecognized direction {}", c)),
        };

        if let Some(c) = chars.next() {
            return Err(anyhow::anyhow!("Unexpected {} after move {}", c, face_char));
        }

        Ok(Move { face, direction })
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Move {
    fn arbitrary<G: quickcheck::Gen>(g: &mut G) -> Self {
        use rand::Rng;
        Move::from_index(g.gen_range(0, N_MOVE))
    }
}
