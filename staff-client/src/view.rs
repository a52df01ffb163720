//! View models
//!
//! Plain data derived from screen state. Rendering is up to the front end.

use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{Employee, EmploymentStatus};

use crate::editor::{EmployeeForm, FormField};
use crate::loader::ListState;

pub const TABLE_COLUMNS: [&str; 8] = [
    "Name",
    "Email",
    "Designation",
    "Department",
    "Salary",
    "Date of Joining",
    "Status",
    "Actions",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenView {
    SignIn(SignInView),
    List(ListView),
    Form(FormView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInView {
    pub title: &'static str,
    pub prompt: &'static str,
    pub button: &'static str,
}

impl Default for SignInView {
    fn default() -> Self {
        Self {
            title: "Employee Management System",
            prompt: "Please sign in to access the employee management system.",
            button: "Sign In",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub add_label: &'static str,
    /// "Employees (N)", shown in every state
    pub card_title: String,
    pub body: ListBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListBody {
    Loading {
        message: &'static str,
    },
    Empty {
        message: &'static str,
        action: &'static str,
    },
    Table {
        title: String,
        columns: &'static [&'static str],
        rows: Vec<EmployeeRow>,
    },
}

impl ListView {
    pub fn build(state: &ListState) -> Self {
        let card_title = format!("Employees ({})", state.employees.len());
        let body = if state.loading {
            ListBody::Loading {
                message: "Loading employees...",
            }
        } else if state.employees.is_empty() {
            ListBody::Empty {
                message: "No employees found",
                action: "Add Your First Employee",
            }
        } else {
            ListBody::Table {
                title: card_title.clone(),
                columns: &TABLE_COLUMNS,
                rows: state.employees.iter().map(EmployeeRow::from).collect(),
            }
        };
        Self {
            title: "Employee Management",
            subtitle: "Manage your company's employee records",
            add_label: "Add Employee",
            card_title,
            body,
        }
    }

    pub fn rows(&self) -> &[EmployeeRow] {
        match &self.body {
            ListBody::Table { rows, .. } => rows,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Secondary,
    Destructive,
}

impl From<EmploymentStatus> for BadgeVariant {
    fn from(status: EmploymentStatus) -> Self {
        match status {
            EmploymentStatus::Active => Self::Secondary,
            EmploymentStatus::Inactive => Self::Destructive,
        }
    }
}

/// One table row, already formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub designation: String,
    pub department: String,
    pub salary: String,
    pub date_of_joining: String,
    pub status: EmploymentStatus,
    pub status_label: &'static str,
    pub badge: BadgeVariant,
}

impl From<&Employee> for EmployeeRow {
    fn from(e: &Employee) -> Self {
        let status = e.status();
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            email: e.email.clone(),
            designation: e.designation.clone(),
            department: e.department.clone(),
            salary: format_salary(e.salary),
            date_of_joining: e.date_of_joining.format("%-m/%-d/%Y").to_string(),
            status,
            status_label: status.label(),
            badge: status.into(),
        }
    }
}

/// `$` plus grouped thousands; up to three fraction digits, none when zero
pub fn format_salary(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}${grouped}.{frac}"),
        None => format!("{sign}${grouped}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub field: FormField,
    pub label: &'static str,
    pub value: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: &'static str,
    pub fields: Vec<FieldView>,
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub cancel_label: &'static str,
}

impl FormView {
    pub fn build(form: &EmployeeForm, editing: bool, in_flight: bool) -> Self {
        let fields = FormField::ALL
            .iter()
            .map(|&field| FieldView {
                field,
                label: field.label(),
                value: form.get(field).to_string(),
                required: field.is_required(),
            })
            .collect();
        let submit_label = match (in_flight, editing) {
            (true, _) => "Saving...",
            (false, true) => "Update Employee",
            (false, false) => "Add Employee",
        };
        Self {
            title: if editing { "Edit Employee" } else { "Add New Employee" },
            fields,
            submit_label,
            submit_enabled: !in_flight,
            cancel_label: "Cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;

    fn employee(last_day: Option<NaiveDate>) -> Employee {
        Employee {
            id: "emp-1".into(),
            name: "Ana Ruiz".into(),
            email: "ana@x.com".into(),
            designation: "Engineer".into(),
            department: "R&D".into(),
            salary: Decimal::from(90000),
            date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            last_day_of_working: last_day,
            user_id: "u-ana".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(Decimal::from(90000)), "$90,000");
        assert_eq!(format_salary(Decimal::from(0)), "$0");
        assert_eq!(format_salary(Decimal::from(1234567)), "$1,234,567");
        assert_eq!(format_salary(Decimal::from_str("999.50").unwrap()), "$999.5");
        assert_eq!(format_salary(Decimal::from_str("1000.00").unwrap()), "$1,000");
        assert_eq!(format_salary(Decimal::from_str("12.34567").unwrap()), "$12.346");
    }

    #[test]
    fn test_row_status_and_badge() {
        let row = EmployeeRow::from(&employee(None));
        assert_eq!(row.status_label, "Active");
        assert_eq!(row.badge, BadgeVariant::Secondary);
        assert_eq!(row.date_of_joining, "1/15/2024");
        assert_eq!(row.salary, "$90,000");

        let mut late = employee(NaiveDate::from_ymd_opt(2024, 6, 1));
        late.date_of_joining = NaiveDate::from_ymd_opt(2023, 11, 3).unwrap();
        let row = EmployeeRow::from(&late);
        assert_eq!(row.date_of_joining, "11/3/2023");
        assert_eq!(row.status_label, "Inactive");
        assert_eq!(row.badge, BadgeVariant::Destructive);
    }

    #[test]
    fn test_list_states() {
        let loading = ListView::build(&ListState::default());
        assert!(matches!(loading.body, ListBody::Loading { message } if message == "Loading employees..."));
        assert_eq!(loading.card_title, "Employees (0)");

        let empty = ListView::build(&ListState {
            employees: vec![],
            loading: false,
        });
        assert!(matches!(
            empty.body,
            ListBody::Empty { action: "Add Your First Employee", .. }
        ));

        let table = ListView::build(&ListState {
            employees: vec![employee(None)],
            loading: false,
        });
        match &table.body {
            ListBody::Table { title, columns, rows } => {
                assert_eq!(title, "Employees (1)");
                assert_eq!(columns.len(), 8);
                assert_eq!(rows[0].name, "Ana Ruiz");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_form_labels() {
        let form = EmployeeForm::default();
        let create = FormView::build(&form, false, false);
        assert_eq!(create.title, "Add New Employee");
        assert_eq!(create.submit_label, "Add Employee");
        assert!(create.submit_enabled);
        assert_eq!(create.fields.len(), 7);
        assert!(!create.fields[6].required);

        let edit = FormView::build(&form, true, false);
        assert_eq!(edit.title, "Edit Employee");
        assert_eq!(edit.submit_label, "Update Employee");

        let saving = FormView::build(&form, true, true);
        assert_eq!(saving.submit_label, "Saving...");
        assert!(!saving.submit_enabled);
    }

    #[test]
    fn test_sign_in_texts() {
        let view = SignInView::default();
        assert_eq!(view.title, "Employee Management System");
        assert_eq!(view.button, "Sign In");
    }
}
