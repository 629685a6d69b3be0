use crate::common::*;

/// Parse a text file of whitespace-separated `id value` lines.
///
/// Blank lines are skipped. Fields after the second one are ignored.
pub fn read_id_value_lines(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let reader = BufReader::new(
        fs::File::open(path).with_context(|| format!("unable to open '{}'", path.display()))?,
    );

    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some((index, Ok(line))),
            Err(err) => Some((index, Err(err))),
        })
        .map(|(index, line)| -> Result<_> {
            let line = line?;
            let mut tokens = line.split_whitespace();
            let (id, value) = tokens.next().zip(tokens.next()).ok_or_else(|| {
                format_err!(
                    "expect 'id value' at line {} of '{}', but get '{}'",
                    index + 1,
                    path.display(),
                    line
                )
            })?;
            Ok((id.to_owned(), value.to_owned()))
        })
        .try_collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_value_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("images.txt");
        fs::write(&path, "1 a/x.jpg\n\n2   b/y.jpg extra\r\n")?;

        let lines = read_id_value_lines(&path)?;
        assert_eq!(
            lines,
            vec![
                ("1".to_owned(), "a/x.jpg".to_owned()),
                ("2".to_owned(), "b/y.jpg".to_owned())
            ]
        );
        Ok(())
    }

    #[test]
    fn reject_single_field_line() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("split.txt");
        fs::write(&path, "1 1\n2\n")?;

        let err = read_id_value_lines(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        Ok(())
    }
}
