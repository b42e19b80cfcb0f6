use crate::StrError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Reads a JSON file into a deserializable structure
///
/// # Input
///
/// * `full_path` -- may be a String, &str, or Path
pub fn read_json<T, P>(full_path: &P) -> Result<T, StrError>
where
    T: DeserializeOwned,
    P: AsRef<OsStr> + ?Sized,
{
    let path = Path::new(full_path).to_path_buf();
    let file = File::open(path).map_err(|_| "cannot open file")?;
    let buffered = BufReader::new(file);
    let data = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
    Ok(data)
}

/// Writes a serializable structure to a JSON file
///
/// The parent directory is created if it does not exist.
///
/// # Input
///
/// * `full_path` -- may be a String, &str, or Path
pub fn write_json<T, P>(full_path: &P, data: &T) -> Result<(), StrError>
where
    T: Serialize + ?Sized,
    P: AsRef<OsStr> + ?Sized,
{
    let path = Path::new(full_path).to_path_buf();
    if let Some(p) = path.parent() {
        fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
    }
    let file = File::create(&path).map_err(|_| "cannot create file")?;
    let mut buffered = BufWriter::new(file);
    serde_json::to_writer(&mut buffered, data).map_err(|_| "cannot write file")?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{read_json, write_json};
    use crate::base::DEFAULT_TEST_DIR;
    use crate::StrError;
    use std::collections::BTreeMap;

    #[test]
    fn read_and_write_work() -> Result<(), StrError> {
        let mut data = BTreeMap::new();
        data.insert("dx".to_string(), 0.0025);
        data.insert("realtime".to_string(), 20.0);
        let path = format!("{}/json_io_read_and_write.json", DEFAULT_TEST_DIR);
        write_json(&path, &data)?;
        let back: BTreeMap<String, f64> = read_json(&path)?;
        assert_eq!(back, data);
        Ok(())
    }

    #[test]
    fn read_captures_errors() {
        let res: Result<Vec<f64>, _> = read_json("/tmp/semicontinuum/test/__not_there__.json");
        assert_eq!(res.err(), Some("cannot open file"));
    }
}
