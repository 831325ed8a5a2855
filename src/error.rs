/// A facelet string that can't describe any cube.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaceletError {
    #[error("Error: Cube definition string contains less than 54 facelets.")]
    TooShort,
    #[error("Error: Cube definition string contains more than 54 facelets.")]
    TooLong,
    #[error("Error: Cube definition string contains a character that is not from {{'U','R','F','D','L','B'}}: {0:?} at position {1}.")]
    InvalidCharacter(char, usize),
    #[error("Error: Cube definition string doesn't contain exactly 9 facelets of each color.")]
    WrongColorCount,
}

/// A cube whose pieces are well formed but which can't be reached by turning faces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CubeError {
    #[error("Error: Some edges are undefined.")]
    UndefinedEdges,
    #[error("Error: Total edge flip is wrong.")]
    EdgeFlip,
    #[error("Error: Some corners are undefined.")]
    UndefinedCorners,
    #[error("Error: Total corner twist is wrong.")]
    CornerTwist,
    #[error("Error: Wrong edge and corner parity.")]
    Parity,
}

/// Anything that stops a facelet string from being turned into a solvable cube.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Facelet(#[from] FaceletError),
    #[error(transparent)]
    Cube(#[from] CubeError),
}

