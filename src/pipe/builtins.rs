use crate::pipe::{Pipe, PipeError, PipeResult};

/// A pipe that parses a string into an integer
#[derive(Debug, Default, Clone, Copy)]
pub struct ParseIntPipe;

impl Pipe for ParseIntPipe {
    type Output = i64;

    fn transform(&self, input: Option<&str>) -> PipeResult<i64> {
        let input = input.ok_or(PipeError::Missing)?;
        input
            .trim()
            .parse::<i64>()
            .map_err(|_| PipeError::Validation(format!("Invalid integer: {}", input)))
    }
}

/// Accepts `true`/`false`/`1`/`0`, case-insensitively.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParseBoolPipe;

impl Pipe for ParseBoolPipe {
    type Output = bool;

    fn transform(&self, input: Option<&str>) -> PipeResult<bool> {
        let input = input.ok_or(PipeError::Missing)?;
        match input.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(PipeError::Validation(format!("Invalid boolean: {}", input))),
        }
    }
}

/// Wraps another pipe and substitutes a default when the value is absent.
#[derive(Debug, Clone)]
pub struct DefaultValuePipe<P: Pipe> {
    inner: P,
    default: P::Output,
}

impl<P: Pipe> DefaultValuePipe<P> {
    pub fn new(inner: P, default: P::Output) -> Self {
        Self { inner, default }
    }
}

impl<P> Pipe for DefaultValuePipe<P>
where
    P: Pipe,
    P::Output: Clone + Sync,
{
    type Output = P::Output;

    fn transform(&self, input: Option<&str>) -> PipeResult<P::Output> {
        match input {
            None => Ok(self.default.clone()),
            Some(value) => self.inner.transform(Some(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(ParseIntPipe.transform(Some(" 42 ")).unwrap(), 42);
        assert!(matches!(
            ParseIntPipe.transform(Some("forty")),
            Err(PipeError::Validation(_))
        ));
        assert!(matches!(ParseIntPipe.transform(None), Err(PipeError::Missing)));
    }

    #[test]
    fn test_parse_bool() {
        assert!(ParseBoolPipe.transform(Some("TRUE")).unwrap());
        assert!(!ParseBoolPipe.transform(Some("0")).unwrap());
        assert!(ParseBoolPipe.transform(Some("maybe")).is_err());
    }

    #[test]
    fn test_default_value() {
        let pipe = DefaultValuePipe::new(ParseIntPipe, 10);
        assert_eq!(pipe.transform(None).unwrap(), 10);
        assert_eq!(pipe.transform(Some("3")).unwrap(), 3);
        assert!(pipe.transform(Some("x")).is_err());
    }
}
