pub const LOG_SUFFIX: &str = "_Log.final.out";

pub const SAMPLE_COLUMN: &str = "Sample";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    TotalReads,
    Unique,
    Multi,
    UnmappedShort,
}

/// STAR label -> field. Lookup is exact, after trimming.
pub const FIELD_LABELS: [(&str, Field); 4] = [
    ("Number of input reads", Field::TotalReads),
    ("Uniquely mapped reads %", Field::Unique),
    ("% of reads mapped to multiple loci", Field::Multi),
    ("% of reads unmapped: too short", Field::UnmappedShort),
];

impl Field {
    pub const ALL: [Field; 4] = [
        Field::TotalReads,
        Field::Unique,
        Field::Multi,
        Field::UnmappedShort,
    ];

    pub fn from_label(label: &str) -> Option<Field> {
        FIELD_LABELS
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, f)| *f)
    }

    pub fn column(self) -> &'static str {
        match self {
            Field::TotalReads => "Total Reads",
            Field::Unique => "Unique (%)",
            Field::Multi => "Multi (%)",
            Field::UnmappedShort => "Unmapped too short (%)",
        }
    }
}

/// The three percentage columns, in chart order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Category {
    Unique,
    Multi,
    UnmappedShort,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Unique, Category::Multi, Category::UnmappedShort];

    pub fn field(self) -> Field {
        match self {
            Category::Unique => Field::Unique,
            Category::Multi => Field::Multi,
            Category::UnmappedShort => Field::UnmappedShort,
        }
    }

    pub fn label(self) -> &'static str {
        self.field().column()
    }
}

/// Raw values of one log file. A field stays `None` when its line was never seen.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogRecord {
    pub total_reads: Option<String>,
    pub unique: Option<String>,
    pub multi: Option<String>,
    pub unmapped_short: Option<String>,
}

impl LogRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::TotalReads => self.total_reads.as_deref(),
            Field::Unique => self.unique.as_deref(),
            Field::Multi => self.multi.as_deref(),
            Field::UnmappedShort => self.unmapped_short.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::TotalReads => &mut self.total_reads,
            Field::Unique => &mut self.unique,
            Field::Multi => &mut self.multi,
            Field::UnmappedShort => &mut self.unmapped_short,
        };
        *slot = Some(value);
    }

    pub fn len(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    pub sample: String,
    pub total_reads: Option<String>,
    pub unique_pct: f64,
    pub multi_pct: f64,
    pub unmapped_short_pct: f64,
}

impl SummaryRow {
    pub fn percentage(&self, category: Category) -> f64 {
        match category {
            Category::Unique => self.unique_pct,
            Category::Multi => self.multi_pct,
            Category::UnmappedShort => self.unmapped_short_pct,
        }
    }
}

/// Long-format view used by the chart: one entry per sample and category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeltedRow<'a> {
    pub sample: &'a str,
    pub category: Category,
    pub percentage: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub const COLUMNS: [&'static str; 5] = [
        SAMPLE_COLUMN,
        "Total Reads",
        "Unique (%)",
        "Multi (%)",
        "Unmapped too short (%)",
    ];

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn melt(&self) -> Vec<MeltedRow<'_>> {
        self.rows
            .iter()
            .flat_map(|row| {
                Category::ALL.iter().map(move |&category| MeltedRow {
                    sample: &row.sample,
                    category,
                    percentage: row.percentage(category),
                })
            })
            .collect()
    }
}
