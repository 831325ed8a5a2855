use crate::prelude::*;

use Face::*;

/// The 54 stickers of a cube, 9 per face in U, R, F, D, L, B order, each face read row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceCube {
    facelets: [Face; 54],
}

/// Sticker positions of each corner, clockwise starting with its U or D sticker.
const CORNER_FACELETS: [[usize; 3]; 8] = [
    [8, 9, 20],
    [6, 18, 38],
    [0, 36, 47],
    [2, 45, 11],
    [29, 26, 15],
    [27, 44, 24],
    [33, 53, 42],
    [35, 17, 51],
];

/// Sticker positions of each edge, U or D sticker first, F or B sticker first for slice edges.
const EDGE_FACELETS: [[usize; 2]; 12] = [
    [5, 10],
    [7, 19],
    [3, 37],
    [1, 46],
    [32, 16],
    [28, 25],
    [30, 43],
    [34, 52],
    [23, 12],
    [21, 41],
    [50, 39],
    [48, 14],
];

const CORNER_COLORS: [[Face; 3]; 8] = [
    [Up, Right, Front],
    [Up, Front, Left],
    [Up, Left, Back],
    [Up, Back, Right],
    [Down, Front, Right],
    [Down, Left, Front],
    [Down, Back, Left],
    [Down, Right, Back],
];

const EDGE_COLORS: [[Face; 2]; 12] = [
    [Up, Right],
    [Up, Front],
    [Up, Left],
    [Up, Back],
    [Down, Right],
    [Down, Front],
    [Down, Left],
    [Down, Back],
    [Front, Right],
    [Front, Left],
    [Back, Left],
    [Back, Right],
];

impl FaceCube {
    pub fn solved() -> FaceCube {
        FaceCube {
            facelets: core::array::from_fn(|i| Face::from_index(i / 9)),
        }
    }

    pub fn facelets(&self) -> &[Face; 54] {
        &self.facelets
    }

    /// The unfolded cube: U on top, L F R B across the middle, D below.
    pub fn net(&self) -> String {
        let row = |face: Face, r: usize| -> String {
            let start = 9 * face.index() + 3 * r;
            self.facelets[start..start + 3]
                .iter()
                .map(|f| f.letter())
                .collect()
        };

        let mut out = String::new();
        for r in 0..3 {
            out += &format!("   {}\n", row(Up, r));
        }
        for r in 0..3 {
            for face in [Left, Front, Right, Back] {
                out += &row(face, r);
            }
            out.push('\n');
        }
        for r in 0..3 {
            out += &format!("   {}\n", row(Down, r));
        }
        out
    }
}

impl core::str::FromStr for FaceCube {
    type Err = FaceletError;

    fn from_str(s: &str) -> Result<FaceCube, FaceletError> {
        let len = s.chars().count();
        if len < 54 {
            return Err(FaceletError::TooShort);
        }
        if len > 54 {
            return Err(FaceletError::TooLong);
        }

        let mut cube = FaceCube::solved();
        let mut count = [0; 6];
        for (i, c) in s.chars().enumerate() {
            let face = match c {
                'U' | 'R' | 'F' | 'D' | 'L' | 'B' => Face::from_letter(c),
                _ => None,
            }
            .ok_or(FaceletError::InvalidCharacter(c, i))?;
            cube.facelets[i] = face;
            count[face.index()] += 1;
        }
        if count.iter().any(|&n| n != 9) {
            return Err(FaceletError::WrongColorCount);
        }
        Ok(cube)
    }
}

impl core::fmt::Display for FaceCube {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for face in self.facelets {
            write!(f, "{}", face.letter())?;
        }
        Ok(())
    }
}

impl From<&CubieCube> for FaceCube {
    fn from(cube: &CubieCube) -> FaceCube {
        let mut out = FaceCube::solved();
        for (i, positions) in CORNER_FACELETS.iter().enumerate() {
            let colors = CORNER_COLORS[cube.cp[i] as usize];
            let ori = (cube.co[i] % 3) as usize;
            for (k, color) in colors.iter().enumerate() {
                out.facelets[positions[(k + ori) % 3]] = *color;
            }
        }
        for (i, positions) in EDGE_FACELETS.iter().enumerate() {
            let colors = EDGE_COLORS[cube.ep[i] as usize];
            let ori = (cube.eo[i] & 1) as usize;
            for (k, color) in colors.iter().enumerate() {
                out.facelets[positions[(k + ori) % 2]] = *color;
            }
        }
        out
    }
}

impl TryFrom<&FaceCube> for CubieCube {
    type Error = CubeError;

    /// Identifies every piece from its stickers. The result still has to pass
    /// [`CubieCube::verify`] to be solvable.
    fn try_from(cube: &FaceCube) -> Result<CubieCube, CubeError> {
        let f = &cube.facelets;
        let mut out = CubieCube::solved();

        for (i, positions) in EDGE_FACELETS.iter().enumerate() {
            let stickers = [f[positions[0]], f[positions[1]]];
            let (edge, ori) = EDGE_COLORS
                .iter()
                .enumerate()
                .find_map(|(j, colors)| {
                    if stickers == *colors {
                        Some((j, 0))
                    } else if stickers == [colors[1], colors[0]] {
                        Some((j, 1))
                    } else {
                        None
                    }
                })
                .ok_or(CubeError::UndefinedEdges)?;
            out.ep[i] = Edge::from_index(edge);
            out.eo[i] = ori;
        }

        for (i, positions) in CORNER_FACELETS.iter().enumerate() {
            let ori = positions
                .iter()
                .position(|&p| matches!(f[p], Up | Down))
                .ok_or(CubeError::UndefinedCorners)?;
            let col1 = f[positions[(ori + 1) % 3]];
            let col2 = f[positions[(ori + 2) % 3]];
            let corner = CORNER_COLORS
                .iter()
                .position(|colors| colors[1] == col1 && colors[2] == col2)
                .ok_or(CubeError::UndefinedCorners)?;
            out.cp[i] = Corner::from_index(corner);
            out.co[i] = ori as u8;
        }

        Ok(out)
    }
}

impl CubieCube {
    /// Parses and checks a facelet string, the entry point for cubes typed in by a user.
    pub fn from_facelets(s: &str) -> Result<CubieCube, InputError> {
        let cube = CubieCube::try_from(&s.parse::<FaceCube>()?)?;
        cube.verify()?;
        Ok(cube)
    }

    pub fn to_facelets(&self) -> String {
        FaceCube::from(self).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    const SOLVED: &str = "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB";

    #[test]
    fn solved_round_trips() {
        assert_eq!(CubieCube::solved().to_facelets(), SOLVED);
        assert_eq!(CubieCube::from_facelets(SOLVED), Ok(CubieCube::solved()));
    }

    #[test]
    fn up_turn_moves_the_side_rows() {
        assert_eq!(
            cube_with_moves("U").to_facelets(),
            "UUUUUUUUUBBBRRRRRRRRRFFFFFFDDDDDDDDDFFFLLLLLLLLLBBBBBB"
        );
    }

    #[test]
    fn length_errors() {
        assert_eq!(
            SOLVED[..53].parse::<FaceCube>(),
            Err(FaceletError::TooShort)
        );
        assert_eq!(
            format!("{}U", SOLVED).parse::<FaceCube>(),
            Err(FaceletError::TooLong)
        );
    }

    #[test]
    fn invalid_character() {
        let s = SOLVED.replacen('R', "X", 1);
        assert_eq!(
            s.parse::<FaceCube>(),
            Err(FaceletError::InvalidCharacter('X', 9))
        );
    }

    #[test]
    fn color_counts() {
        let s = SOLVED.replacen('R', "U", 1);
        assert_eq!(s.parse::<FaceCube>(), Err(FaceletError::WrongColorCount));
        assert_eq!(
            FaceletError::WrongColorCount.to_string(),
            "Error: Cube definition string doesn't contain exactly 9 facelets of each color."
        );
    }

    #[test]
    fn twisted_corner_is_unsolvable() {
        // URF corner rotated in place.
        let mut s: Vec<char> = SOLVED.chars().collect();
        s[8] = 'F';
        s[9] = 'U';
        s[20] = 'R';
        let s: String = s.into_iter().collect();
        assert_eq!(
            CubieCube::from_facelets(&s),
            Err(InputError::Cube(CubeError::CornerTwist))
        );
    }

    #[test]
    fn net_layout() {
        let net = FaceCube::solved().net();
        let lines: Vec<&str> = net.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "   UUU");
        assert_eq!(lines[4], "LLLFFFRRRBBB");
        assert_eq!(lines[8], "   DDD");
    }

    #[quickcheck]
    fn cubie_facelet_round_trip(moves: Vec<Move>) -> bool {
        let cube = CubieCube::from_moves(&moves);
        let facelets = cube.to_facelets();
        CubieCube::from_facelets(&facelets) == Ok(cube)
            && facelets.parse::<FaceCube>().map(|f| f.to_string()) == Ok(facelets)
    }

    #[test]
    fn random_cubes_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let cube = CubieCube::random(&mut rng);
            assert_eq!(CubieCube::from_facelets(&cube.to_facelets()), Ok(cube));
        }
    }
}
