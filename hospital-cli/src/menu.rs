//! 控制台菜单
//!
//! 打印编号菜单、读取选择、提示输入字段并调用 `HospitalSystem`。
//! 业务错误只打印出来，然后回到菜单；只有终端读写失败才会结束循环。

use hospital_core::{Appointment, Doctor, MedicalRecord, Patient, RecordKind};
use hospital_records::HospitalSystem;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const MAIN_MENU: &str = "
=== Hospital Records ===
1. Patients
2. Doctors
3. Appointments
4. Medical records
5. Show all
0. Exit";

const PATIENTS_MENU: &str = "
--- Patients ---
1. Add patient
2. List patients
3. Search patients
4. Delete patient
0. Back";

const DOCTORS_MENU: &str = "
--- Doctors ---
1. Add doctor
2. List doctors
3. Search doctors
4. Delete doctor
0. Back";

const APPOINTMENTS_MENU: &str = "
--- Appointments ---
1. Schedule appointment
2. List appointments
3. Search appointments
4. Appointments for patient
5. Appointments for doctor
6. Cancel appointment
0. Back";

const RECORDS_MENU: &str = "
--- Medical records ---
1. Add medical record
2. List medical records
3. Search medical records
4. Records for patient
5. Delete medical record
0. Back";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// 菜单循环
pub struct Menu<'a, R, W> {
    system: &'a mut HospitalSystem,
    input: R,
    output: W,
}

impl<'a, R, W> Menu<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(system: &'a mut HospitalSystem, input: R, output: W) -> Self {
        Self {
            system,
            input,
            output,
        }
    }

    /// 运行直到用户选择退出或输入结束
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.say(MAIN_MENU).await?;
            let Some(choice) = self.prompt_required("Choose an option: ").await? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.patients_menu().await?,
                "2" => self.doctors_menu().await?,
                "3" => self.appointments_menu().await?,
                "4" => self.records_menu().await?,
                "5" => {
                    self.show_all().await?;
                    Flow::Continue
                }
                "0" => Flow::Exit,
                _ => {
                    self.say("Invalid choice. Try again.").await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.say("Goodbye!").await
    }

    // ---- 子菜单 ----

    async fn patients_menu(&mut self) -> io::Result<Flow> {
        loop {
            self.say(PATIENTS_MENU).await?;
            let Some(choice) = self.prompt_required("Choose: ").await? else {
                return Ok(Flow::Exit);
            };

            let flow = match choice.as_str() {
                "1" => self.add_patient().await?,
                "2" => {
                    let lines = self.system.patients().iter().map(|p| p.to_string()).collect();
                    self.print_list("Patients:", "No patients found.", lines).await?;
                    Flow::Continue
                }
                "3" => {
                    let Some(query) = self.prompt_required("Search (id or name): ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .search_patients(&query)
                        .into_iter()
                        .map(|p| p.to_string())
                        .collect();
                    self.print_list("Matches:", "No patients found.", lines).await?;
                    Flow::Continue
                }
                "4" => {
                    let Some(id) = self.prompt_required("Patient ID to delete: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let message = match self.system.delete_patient(&id).await {
                        Ok(p) => format!("Deleted patient {} - {}.", p.patient_id, p.name),
                        Err(e) => format!("Error: {}", e),
                    };
                    self.say(&message).await?;
                    Flow::Continue
                }
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.say("Invalid choice.").await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    async fn doctors_menu(&mut self) -> io::Result<Flow> {
        loop {
            self.say(DOCTORS_MENU).await?;
            let Some(choice) = self.prompt_required("Choose: ").await? else {
                return Ok(Flow::Exit);
            };

            let flow = match choice.as_str() {
                "1" => self.add_doctor().await?,
                "2" => {
                    let lines = self.system.doctors().iter().map(|d| d.to_string()).collect();
                    self.print_list("Doctors:", "No doctors found.", lines).await?;
                    Flow::Continue
                }
                "3" => {
                    let Some(query) =
                        self.prompt_required("Search (id, name or specialization): ").await?
                    else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .search_doctors(&query)
                        .into_iter()
                        .map(|d| d.to_string())
                        .collect();
                    self.print_list("Matches:", "No doctors found.", lines).await?;
                    Flow::Continue
                }
                "4" => {
                    let Some(id) = self.prompt_required("Doctor ID to delete: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let message = match self.system.delete_doctor(&id).await {
                        Ok(d) => format!("Deleted doctor {} - Dr. {}.", d.doctor_id, d.name),
                        Err(e) => format!("Error: {}", e),
                    };
                    self.say(&message).await?;
                    Flow::Continue
                }
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.say("Invalid choice.").await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    async fn appointments_menu(&mut self) -> io::Result<Flow> {
        loop {
            self.say(APPOINTMENTS_MENU).await?;
            let Some(choice) = self.prompt_required("Choose: ").await? else {
                return Ok(Flow::Exit);
            };

            let flow = match choice.as_str() {
                "1" => self.schedule_appointment().await?,
                "2" => {
                    let mut all: Vec<&Appointment> = self.system.appointments().iter().collect();
                    all.sort_by(|a, b| a.date_time.cmp(&b.date_time));
                    let lines = all.into_iter().map(|a| self.describe_appointment(a)).collect();
                    self.print_list("Appointments:", "No appointments.", lines).await?;
                    Flow::Continue
                }
                "3" => {
                    let Some(query) = self.prompt_required("Search: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .search_appointments(&query)
                        .into_iter()
                        .map(|a| self.describe_appointment(a))
                        .collect();
                    self.print_list("Matches:", "No appointments found.", lines).await?;
                    Flow::Continue
                }
                "4" => {
                    let Some(id) = self.prompt_required("Patient ID: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .appointments_for_patient(&id)
                        .into_iter()
                        .map(|a| self.describe_appointment(a))
                        .collect();
                    self.print_list("Appointments:", "No appointments for patient.", lines)
                        .await?;
                    Flow::Continue
                }
                "5" => {
                    let Some(id) = self.prompt_required("Doctor ID: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .appointments_for_doctor(&id)
                        .into_iter()
                        .map(|a| self.describe_appointment(a))
                        .collect();
                    self.print_list("Appointments:", "No appointments for doctor.", lines)
                        .await?;
                    Flow::Continue
                }
                "6" => {
                    let Some(id) = self.prompt_required("Appointment ID to cancel: ").await?
                    else {
                        return Ok(Flow::Exit);
                    };
                    let message = match self.system.cancel_appointment(&id).await {
                        Ok(a) => format!("Cancelled appointment {}.", a.appointment_id),
                        Err(e) => format!("Error: {}", e),
                    };
                    self.say(&message).await?;
                    Flow::Continue
                }
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.say("Invalid choice.").await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    async fn records_menu(&mut self) -> io::Result<Flow> {
        loop {
            self.say(RECORDS_MENU).await?;
            let Some(choice) = self.prompt_required("Choose: ").await? else {
                return Ok(Flow::Exit);
            };

            let flow = match choice.as_str() {
                "1" => self.add_medical_record().await?,
                "2" => {
                    let lines = self
                        .system
                        .medical_records()
                        .iter()
                        .map(|r| r.to_string())
                        .collect();
                    self.print_list("Medical records:", "No medical records.", lines).await?;
                    Flow::Continue
                }
                "3" => {
                    let Some(query) = self.prompt_required("Search: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .search_medical_records(&query)
                        .into_iter()
                        .map(|r| r.to_string())
                        .collect();
                    self.print_list("Matches:", "No medical records found.", lines).await?;
                    Flow::Continue
                }
                "4" => {
                    let Some(id) = self.prompt_required("Patient ID: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let lines = self
                        .system
                        .records_for_patient(&id)
                        .into_iter()
                        .map(|r| r.to_string())
                        .collect();
                    self.print_list("Medical records:", "No medical records for patient.", lines)
                        .await?;
                    Flow::Continue
                }
                "5" => {
                    let Some(id) = self.prompt_required("Record ID to delete: ").await? else {
                        return Ok(Flow::Exit);
                    };
                    let message = match self.system.delete_medical_record(&id).await {
                        Ok(r) => format!("Deleted medical record {}.", r.record_id),
                        Err(e) => format!("Error: {}", e),
                    };
                    self.say(&message).await?;
                    Flow::Continue
                }
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.say("Invalid choice.").await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    // ---- 新增记录 ----

    async fn add_patient(&mut self) -> io::Result<Flow> {
        let Some(patient_id) = self.prompt_id(RecordKind::Patient).await? else {
            return Ok(Flow::Exit);
        };
        let Some(name) = self.prompt_required("Name: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(age) = self.prompt_age("Age: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(gender) = self.prompt("Gender (optional): ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(phone) = self.prompt("Phone (optional): ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(notes) = self.prompt("Notes (optional): ").await? else {
            return Ok(Flow::Exit);
        };

        let mut patient = Patient::new(patient_id, name, age);
        patient.gender = gender;
        patient.phone = phone;
        patient.notes = notes;

        let message = match self.system.add_patient(patient).await {
            Ok(p) => format!("Added patient {} - {}", p.patient_id, p.name),
            Err(e) => format!("Error: {}", e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    async fn add_doctor(&mut self) -> io::Result<Flow> {
        let Some(doctor_id) = self.prompt_id(RecordKind::Doctor).await? else {
            return Ok(Flow::Exit);
        };
        let Some(name) = self.prompt_required("Name: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(specialization) = self.prompt_required("Specialization: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(phone) = self.prompt("Phone (optional): ").await? else {
            return Ok(Flow::Exit);
        };

        let mut doctor = Doctor::new(doctor_id, name, specialization);
        doctor.phone = phone;

        let message = match self.system.add_doctor(doctor).await {
            Ok(d) => format!("Added doctor {} - Dr. {}", d.doctor_id, d.name),
            Err(e) => format!("Error: {}", e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    async fn schedule_appointment(&mut self) -> io::Result<Flow> {
        let Some(appointment_id) = self.prompt_id(RecordKind::Appointment).await? else {
            return Ok(Flow::Exit);
        };
        let Some(patient_id) = self.prompt_required("Patient ID: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(doctor_id) = self.prompt_required("Doctor ID: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(date_time) = self.prompt_required("Date/time (YYYY-MM-DD HH:MM): ").await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(reason) = self.prompt("Reason (optional): ").await? else {
            return Ok(Flow::Exit);
        };

        let mut appointment = Appointment::new(appointment_id, patient_id, doctor_id, date_time);
        appointment.reason = reason;

        let message = match self.system.schedule_appointment(appointment).await {
            Ok(a) => format!("Appointment scheduled: {} at {}", a.appointment_id, a.date_time),
            Err(e) => format!("Error: {}", e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    async fn add_medical_record(&mut self) -> io::Result<Flow> {
        let Some(record_id) = self.prompt_id(RecordKind::MedicalRecord).await? else {
            return Ok(Flow::Exit);
        };
        let Some(patient_id) = self.prompt_required("Patient ID: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(diagnosis) = self.prompt_required("Diagnosis: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(notes) = self.prompt("Notes (optional): ").await? else {
            return Ok(Flow::Exit);
        };

        let mut record = MedicalRecord::new(record_id, patient_id, diagnosis);
        record.notes = notes;

        let message = match self.system.add_medical_record(record).await {
            Ok(r) => format!("Added medical record {} for patient {}", r.record_id, r.patient_id),
            Err(e) => format!("Error: {}", e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    // ---- 显示 ----

    async fn show_all(&mut self) -> io::Result<()> {
        self.say("\n--- All data ---").await?;

        let patients = self.system.patients().iter().map(|p| p.to_string()).collect();
        self.print_list("Patients:", "No patients found.", patients).await?;

        let doctors = self.system.doctors().iter().map(|d| d.to_string()).collect();
        self.print_list("Doctors:", "No doctors found.", doctors).await?;

        let mut all: Vec<&Appointment> = self.system.appointments().iter().collect();
        all.sort_by(|a, b| a.date_time.cmp(&b.date_time));
        let appointments = all.into_iter().map(|a| self.describe_appointment(a)).collect();
        self.print_list("Appointments:", "No appointments.", appointments).await?;

        let records = self.system.medical_records().iter().map(|r| r.to_string()).collect();
        self.print_list("Medical records:", "No medical records.", records).await
    }

    /// 预约描述，能找到时用姓名代替ID
    fn describe_appointment(&self, appointment: &Appointment) -> String {
        let patient = self
            .system
            .get_patient(&appointment.patient_id)
            .map(|p| p.name.as_str())
            .unwrap_or(&appointment.patient_id);
        let doctor = self
            .system
            .get_doctor(&appointment.doctor_id)
            .map(|d| d.name.as_str())
            .unwrap_or(&appointment.doctor_id);

        let mut line = format!(
            "{}: {} - Patient: {} | Doctor: Dr. {}",
            appointment.appointment_id, appointment.date_time, patient, doctor
        );
        if !appointment.reason.is_empty() {
            line.push_str(&format!(" | Reason: {}", appointment.reason));
        }
        line
    }

    async fn print_list(&mut self, title: &str, empty: &str, lines: Vec<String>) -> io::Result<()> {
        if lines.is_empty() {
            return self.say(empty).await;
        }
        self.say(title).await?;
        for line in lines {
            self.say(&format!("  {}", line)).await?;
        }
        Ok(())
    }

    // ---- 输入输出 ----

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// 读取一行，输入结束时返回 `None`
    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn prompt_required(&mut self, label: &str) -> io::Result<Option<String>> {
        loop {
            match self.prompt(label).await? {
                Some(value) if value.is_empty() => self.say("Input cannot be empty.").await?,
                other => return Ok(other),
            }
        }
    }

    async fn prompt_age(&mut self, label: &str) -> io::Result<Option<u32>> {
        loop {
            let Some(value) = self.prompt_required(label).await? else {
                return Ok(None);
            };
            match value.parse::<u32>() {
                Ok(age) => return Ok(Some(age)),
                Err(_) => self.say("Please enter a valid non-negative integer.").await?,
            }
        }
    }

    /// 提示输入ID，直接回车时使用下一个顺序ID
    async fn prompt_id(&mut self, kind: RecordKind) -> io::Result<Option<String>> {
        let suggested = self.system.next_id(kind);
        let label = format!("{} ID [{}]: ", kind, suggested);
        Ok(self
            .prompt(&label)
            .await?
            .map(|value| if value.is_empty() { suggested } else { value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_storage::{CollectionFiles, FileStorage};
    use tempfile::TempDir;

    async fn open_in(dir: &TempDir) -> HospitalSystem {
        HospitalSystem::open(FileStorage::new(dir.path()), CollectionFiles::default()).await
    }

    async fn run_script(system: &mut HospitalSystem, script: &str) -> String {
        let mut output = Vec::new();
        let mut menu = Menu::new(system, script.as_bytes(), &mut output);
        menu.run().await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_patient_add_list_search_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;

        let script = "1\n1\nP001\nAli\n21\n\n\n\n2\n3\nP001\n4\nP001\n2\n0\n0\n";
        let output = run_script(&mut system, script).await;

        assert!(output.contains("Added patient P001 - Ali"));
        assert!(output.contains("  P001: Ali, age 21"));
        assert!(output.contains("Deleted patient P001 - Ali."));
        assert!(output.contains("No patients found."));
        assert!(output.ends_with("Goodbye!\n"));
        assert!(system.patients().is_empty());
    }

    #[tokio::test]
    async fn test_suggested_id_and_bad_age() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;

        let script = "1\n1\n\nSara\nabc\n-4\n34\nF\n555-0101\n\n0\n0\n";
        let output = run_script(&mut system, script).await;

        assert!(output.contains("Patient ID [P1]: "));
        assert_eq!(output.matches("Please enter a valid non-negative integer.").count(), 2);
        let patient = system.get_patient("P1").unwrap();
        assert_eq!(patient.age, 34);
        assert_eq!(patient.phone, "555-0101");
    }

    #[tokio::test]
    async fn test_errors_are_reported_and_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;
        system.add_patient(Patient::new("P1", "Ali", 21)).await.unwrap();

        let script = "1\n4\nP9\n1\nP1\nCopy\n30\n\n\n\n0\n3\n1\n\nP1\nD1\n2024-05-01 09:30\n\n0\n9\n0\n";
        let output = run_script(&mut system, script).await;

        assert!(output.contains("Error: Patient not found: P9"));
        assert!(output.contains("Error: Patient already exists: P1"));
        assert!(output.contains("Error: Doctor not found: D1"));
        assert!(output.contains("Invalid choice. Try again."));
        assert_eq!(system.patients().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_time_reported_in_english() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;
        system.add_patient(Patient::new("P1", "Ali", 21)).await.unwrap();
        system.add_doctor(Doctor::new("D1", "House", "Diagnostics")).await.unwrap();

        let script = "3\n1\n\nP1\nD1\n01/05/2024 9am\n\n0\n0\n";
        let output = run_script(&mut system, script).await;

        assert!(output
            .contains("Error: Invalid input: date/time format should be YYYY-MM-DD HH:MM"));
        assert!(system.appointments().is_empty());
    }

    #[tokio::test]
    async fn test_appointments_show_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;
        system.add_patient(Patient::new("P1", "Ali", 21)).await.unwrap();
        system.add_doctor(Doctor::new("D1", "House", "Diagnostics")).await.unwrap();

        let script = "3\n1\n\nP1\nD1\n2024-05-01 09:30\nCheck-up\n4\nP1\n0\n5\n0\n";
        let output = run_script(&mut system, script).await;

        assert!(output.contains("Appointment scheduled: A1 at 2024-05-01 09:30"));
        assert!(output.contains("A1: 2024-05-01 09:30 - Patient: Ali | Doctor: Dr. House | Reason: Check-up"));
        assert!(output.contains("--- All data ---"));
        assert!(output.contains("No medical records."));
    }

    #[tokio::test]
    async fn test_medical_record_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;
        system.add_patient(Patient::new("P1", "Ali", 21)).await.unwrap();

        let script = "4\n1\n\nP1\nAsthma\nMild\n3\nasth\n5\nR1\n2\n0\n0\n";
        let output = run_script(&mut system, script).await;

        assert!(output.contains("Added medical record R1 for patient P1"));
        assert!(output.contains("  R1: patient P1 | Asthma | Notes: Mild"));
        assert!(output.contains("Deleted medical record R1."));
        assert!(system.medical_records().is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let dir = tempfile::tempdir().unwrap();
        let mut system = open_in(&dir).await;

        let output = run_script(&mut system, "2\n1\nD1\nHouse\n").await;

        assert!(output.ends_with("Goodbye!\n"));
        assert!(system.doctors().is_empty());
    }
}
