use monitor_core::{is_valid_crn, CourseRecord, CourseStatus, SnapshotMap};
use monitor_logging::{monitor_debug, monitor_error, monitor_info, monitor_warn};
use scraper::{ElementRef, Html, Selector};

/// Course rows carry `RegPageHeader` or `RegPageHeaderWhite`.
const ROW_SELECTOR: &str = "tr[class*='RegPageHeader']";
const CHECKBOX_SELECTOR: &str = "input[type='checkbox']";
const LINK_SELECTOR: &str = "a";

// 1-based cell positions within a course row.
const STATUS_CELL: usize = 2;
const CRN_CELL: usize = 3;
const SUBJECT_CELL: usize = 4;
const COURSE_NUM_CELL: usize = 5;
const TITLE_CELL: usize = 6;
const CAMPUS_CELL: usize = 7;
const DATES_CELL: usize = 8;
const INSTRUCTOR_CELL: usize = 9;

/// A table row that looked like a course but was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    InvalidCrn { row: usize, crn: String },
    DuplicateCrn { row: usize, crn: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    pub courses: SnapshotMap,
    pub rejected: Vec<RowRejection>,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Extraction;
}

/// Reads the course table of the registration timetable page.
#[derive(Debug, Default)]
pub struct RegistrationPageExtractor;

struct Selectors {
    row: Selector,
    checkbox: Selector,
    link: Selector,
}

impl Selectors {
    fn parse() -> Option<Self> {
        Some(Self {
            row: Selector::parse(ROW_SELECTOR).ok()?,
            checkbox: Selector::parse(CHECKBOX_SELECTOR).ok()?,
            link: Selector::parse(LINK_SELECTOR).ok()?,
        })
    }
}

impl Extractor for RegistrationPageExtractor {
    fn extract(&self, html: &str) -> Extraction {
        let Some(selectors) = Selectors::parse() else {
            monitor_error!("Course table selectors failed to parse; treating page as empty");
            return Extraction::default();
        };

        let doc = Html::parse_document(html);
        let rows: Vec<ElementRef<'_>> = doc.select(&selectors.row).collect();
        monitor_info!("Processing {} rows...", rows.len());

        let mut extraction = Extraction::default();
        for (row_index, row) in rows.into_iter().enumerate() {
            let row_text: String = row.text().collect();
            if row_text.contains("CRN") {
                continue;
            }

            let cells = row_cells(row);
            let crn = cell_text(&cells, CRN_CELL);
            if !is_valid_crn(&crn) {
                monitor_debug!("Skipping row {} with CRN {:?}", row_index, crn);
                extraction.rejected.push(RowRejection::InvalidCrn {
                    row: row_index,
                    crn,
                });
                continue;
            }
            if extraction.courses.contains(&crn) {
                monitor_warn!("Skipping row {}: CRN {} already seen on this page", row_index, crn);
                extraction.rejected.push(RowRejection::DuplicateCrn {
                    row: row_index,
                    crn,
                });
                continue;
            }

            let record = CourseRecord {
                status: determine_status(row, &cells, &selectors),
                subject: cell_text(&cells, SUBJECT_CELL),
                course_num: cell_text(&cells, COURSE_NUM_CELL),
                title: cell_link_text(&cells, TITLE_CELL, &selectors.link),
                campus: cell_link_text(&cells, CAMPUS_CELL, &selectors.link),
                dates: cell_link_text(&cells, DATES_CELL, &selectors.link),
                instructor: cell_text(&cells, INSTRUCTOR_CELL),
                crn,
            };
            monitor_debug!(
                "{} {}: {} | CRN {} | {} | {} | {} | {}",
                record.subject,
                record.course_num,
                record.title,
                record.crn,
                record.status,
                record.instructor,
                record.campus,
                record.dates
            );
            extraction.courses.insert(record);
        }

        monitor_info!("Parsed {} courses", extraction.courses.len());
        extraction
    }
}

fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

fn normalized_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn cell_text(cells: &[ElementRef<'_>], position: usize) -> String {
    cells
        .get(position - 1)
        .map(|cell| normalized_text(*cell))
        .unwrap_or_default()
}

fn cell_link_text(cells: &[ElementRef<'_>], position: usize, link: &Selector) -> String {
    cells
        .get(position - 1)
        .and_then(|cell| cell.select(link).next())
        .map(normalized_text)
        .unwrap_or_default()
}

/// Registered if the row's checkbox says so, else from the status link text.
fn determine_status(row: ElementRef<'_>, cells: &[ElementRef<'_>], selectors: &Selectors) -> CourseStatus {
    if let Some(checkbox) = row.select(&selectors.checkbox).next() {
        let value = checkbox.value().attr("value").unwrap_or_default();
        if value.contains("Registered") || checkbox.value().attr("checked").is_some() {
            return CourseStatus::Registered;
        }
    }

    let raw_status = cell_link_text(cells, STATUS_CELL, &selectors.link);
    if raw_status.contains("Registered") {
        CourseStatus::Registered
    } else if raw_status.contains("Full") {
        CourseStatus::Full
    } else {
        CourseStatus::Available
    }
}
