use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid effective mass '{0}'. Expected one value or three comma-separated values (e.g., '0.3' or '0.3,0.3,0.9').")]
    InvalidMass(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),
}

/// Parses an effective mass given either as one isotropic value or as three principal values.
pub fn parse_mass(s: &str) -> Result<[f64; 3], ParseError> {
    let invalid = || ParseError::InvalidMass(s.to_string());
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [m] => Ok([*m; 3]),
        [m1, m2, m3] => Ok([*m1, *m2, *m3]),
        _ => Err(invalid()),
    }
}

/// Splits a `KEY=VALUE` assignment at the first `=`.
pub fn parse_assignment(s: &str) -> Result<(&str, &str), ParseError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidAssignment(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isotropic_mass_is_repeated() {
        assert_eq!(parse_mass("0.25").unwrap(), [0.25; 3]);
    }

    #[test]
    fn anisotropic_mass_keeps_order() {
        assert_eq!(parse_mass("0.2, 0.3,0.9").unwrap(), [0.2, 0.3, 0.9]);
    }

    #[test]
    fn two_components_are_rejected() {
        assert_eq!(
            parse_mass("0.2,0.3").unwrap_err(),
            ParseError::InvalidMass("0.2,0.3".to_string())
        );
        assert!(parse_mass("heavy").is_err());
    }

    #[test]
    fn assignment_splits_at_first_equals() {
        assert_eq!(parse_assignment("a.b=c=d").unwrap(), ("a.b", "c=d"));
        assert!(parse_assignment("no-value").is_err());
        assert!(parse_assignment("=1").is_err());
    }
}
