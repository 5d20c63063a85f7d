//! Wager record and its wire encoding
//!
//! ```text
//! record = agency|first_name|last_name|document|birth_date|number
//! batch  = record;record;...;record
//! ```
//!
//! The client only ever sends records, so the codec is one-directional.

use super::errors::RecordError;

/// Separates the fields of one serialized record
pub const FIELD_DELIMITER: char = '|';

/// Separates serialized records inside a batch payload
pub const RECORD_SEPARATOR: char = ';';

/// Separates fields of one line of the input file
pub const INPUT_FIELD_SEPARATOR: char = ',';

/// Fields per input line (the agency id is not part of the file)
pub const INPUT_ARITY: usize = 5;

/// One wager placed at an agency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    agency: String,
    first_name: String,
    last_name: String,
    document: String,
    birth_date: String,
    number: String,
}

impl Record {
    /// Build a record, rejecting fields that would break the wire framing.
    pub fn new(
        agency: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        document: impl Into<String>,
        birth_date: impl Into<String>,
        number: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let record = Self {
            agency: agency.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            document: document.into(),
            birth_date: birth_date.into(),
            number: number.into(),
        };
        for (name, value) in record.named_fields() {
            if let Some(character) = value
                .chars()
                .find(|&c| matches!(c, FIELD_DELIMITER | RECORD_SEPARATOR | '\n' | '\r'))
            {
                return Err(RecordError::ReservedCharacter {
                    field: name,
                    character,
                });
            }
        }
        Ok(record)
    }

    /// Build a record from one line of the input file.
    pub fn from_line(agency: &str, line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.split(INPUT_FIELD_SEPARATOR).collect();
        if fields.len() != INPUT_ARITY {
            return Err(RecordError::FieldCount {
                expected: INPUT_ARITY,
                found: fields.len(),
            });
        }
        Self::new(agency, fields[0], fields[1], fields[2], fields[3], fields[4])
    }

    pub fn agency(&self) -> &str {
        &self.agency
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    fn named_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("agency", &self.agency),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("document", &self.document),
            ("birth_date", &self.birth_date),
            ("number", &self.number),
        ]
    }

    /// Serialize as `agency|first_name|last_name|document|birth_date|number`
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        for (i, (_, value)) in self.named_fields().iter().enumerate() {
            if i > 0 {
                out.push(FIELD_DELIMITER as u8);
            }
            out.extend_from_slice(value.as_bytes());
        }
    }

    fn encoded_len(&self) -> usize {
        let fields = self.named_fields();
        fields.iter().map(|(_, v)| v.len()).sum::<usize>() + fields.len() - 1
    }
}

/// Ordered records sent together in one frame
pub type Batch = Vec<Record>;

/// Serialize a batch as records joined by `;`
pub fn serialize_batch(batch: &[Record]) -> Vec<u8> {
    let capacity = batch.iter().map(|r| r.encoded_len() + 1).sum();
    let mut out = Vec::with_capacity(capacity);
    for (i, record) in batch.iter().enumerate() {
        if i > 0 {
            out.push(RECORD_SEPARATOR as u8);
        }
        record.write_to(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(document: &str) -> Record {
        Record::new("1", "Santiago", "Lorca", document, "1999-03-17", "7574").unwrap()
    }

    #[test]
    fn test_serialize_record() {
        assert_eq!(
            sample("30904465").serialize(),
            b"1|Santiago|Lorca|30904465|1999-03-17|7574".to_vec()
        );
    }

    #[test]
    fn test_serialize_then_split_recovers_fields() {
        let record = sample("30904465");
        let wire = String::from_utf8(record.serialize()).unwrap();
        let fields: Vec<&str> = wire.split(FIELD_DELIMITER).collect();
        assert_eq!(
            fields,
            vec![
                record.agency(),
                record.first_name(),
                record.last_name(),
                record.document(),
                record.birth_date(),
                record.number()
            ]
        );
    }

    #[test]
    fn test_empty_fields_survive_split() {
        let record = Record::new("1", "", "Lorca", "", "1999-03-17", "").unwrap();
        let wire = String::from_utf8(record.serialize()).unwrap();
        assert_eq!(wire.split(FIELD_DELIMITER).count(), 6);
        assert_eq!(wire.len(), record.encoded_len());
    }

    #[test]
    fn test_serialize_batch() {
        let batch = vec![sample("1"), sample("2")];
        assert_eq!(
            serialize_batch(&batch),
            b"1|Santiago|Lorca|1|1999-03-17|7574;1|Santiago|Lorca|2|1999-03-17|7574".to_vec()
        );
    }

    #[test]
    fn test_serialize_empty_batch() {
        assert!(serialize_batch(&[]).is_empty());
    }

    #[test]
    fn test_from_line() {
        let record = Record::from_line("4", "Ana,Diaz,123,2000-01-02,42").unwrap();
        assert_eq!(record.agency(), "4");
        assert_eq!(record.first_name(), "Ana");
        assert_eq!(record.number(), "42");
    }

    #[test]
    fn test_from_line_wrong_arity() {
        let err = Record::from_line("4", "Ana,Diaz,123,2000-01-02").unwrap_err();
        assert_eq!(err, RecordError::FieldCount { expected: 5, found: 4 });
    }

    #[test]
    fn test_reserved_characters_rejected() {
        let err = Record::from_line("4", "A|na,Diaz,123,2000-01-02,42").unwrap_err();
        assert_eq!(
            err,
            RecordError::ReservedCharacter {
                field: "first_name",
                character: '|'
            }
        );
        assert!(Record::new("4", "Ana", "Di;az", "1", "2", "3").is_err());
    }

    #[test]
    fn test_line_breaks_rejected() {
        let err = Record::new("4", "Ana", "Diaz", "1", "2000-01-02", "4\r").unwrap_err();
        assert_eq!(
            err,
            RecordError::ReservedCharacter {
                field: "number",
                character: '\r'
            }
        );
        assert!(Record::new("4", "Ana\n", "Diaz", "1", "2", "3").is_err());
        assert!(Record::new("4", "Ana", "Diaz", "1", "2000-01-02", "42").is_ok());
    }
}
