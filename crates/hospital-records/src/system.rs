//! 医院记录系统
//!
//! 持有四类记录集合。每次修改内存集合后立即把整个集合写回对应文件。

use crate::collection::RecordCollection;
use hospital_core::utils::parse_appointment_time;
use hospital_core::{
    Appointment, Doctor, HospitalError, MedicalRecord, Patient, Record, RecordKind, Result,
};
use hospital_storage::{CollectionFiles, FileStorage};
use tracing::{error, info};

/// 医院记录系统
#[derive(Debug)]
pub struct HospitalSystem {
    storage: FileStorage,
    files: CollectionFiles,
    patients: RecordCollection<Patient>,
    doctors: RecordCollection<Doctor>,
    appointments: RecordCollection<Appointment>,
    records: RecordCollection<MedicalRecord>,
}

impl HospitalSystem {
    /// 从存储加载全部集合
    pub async fn open(storage: FileStorage, files: CollectionFiles) -> Self {
        let patients = RecordCollection::from_records(storage.load(&files.patients).await);
        let doctors = RecordCollection::from_records(storage.load(&files.doctors).await);
        let appointments = RecordCollection::from_records(storage.load(&files.appointments).await);
        let records = RecordCollection::from_records(storage.load(&files.records).await);

        info!(
            "Loaded {} patients, {} doctors, {} appointments, {} medical records from {}",
            patients.len(),
            doctors.len(),
            appointments.len(),
            records.len(),
            storage.base_path().display()
        );

        Self {
            storage,
            files,
            patients,
            doctors,
            appointments,
            records,
        }
    }

    async fn persist<T: Record>(&self, collection: &RecordCollection<T>) -> Result<()> {
        let file_name = self.files.file_for(T::KIND);
        if let Err(e) = self.storage.save(file_name, collection.list()).await {
            error!("Failed to persist {} collection to {}: {}", T::KIND, file_name, e);
            return Err(e);
        }
        Ok(())
    }

    /// 下一个可用的顺序ID
    pub fn next_id(&self, kind: RecordKind) -> String {
        match kind {
            RecordKind::Patient => self.patients.next_id(),
            RecordKind::Doctor => self.doctors.next_id(),
            RecordKind::Appointment => self.appointments.next_id(),
            RecordKind::MedicalRecord => self.records.next_id(),
        }
    }

    // ---- 患者 ----

    pub async fn add_patient(&mut self, patient: Patient) -> Result<Patient> {
        require_non_empty("patient name", &patient.name)?;

        self.patients.insert(patient.clone())?;
        self.persist(&self.patients).await?;

        info!("Added patient {} ({})", patient.patient_id, patient.name);
        Ok(patient)
    }

    pub fn patients(&self) -> &[Patient] {
        self.patients.list()
    }

    pub fn get_patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.get(patient_id)
    }

    pub fn search_patients(&self, query: &str) -> Vec<&Patient> {
        self.patients.search(query)
    }

    /// 删除患者，并删除该患者的所有预约
    ///
    /// 两个集合都先在内存中修改再分别写回，写回失败时返回第一个错误。
    pub async fn delete_patient(&mut self, patient_id: &str) -> Result<Patient> {
        let patient = self.patients.remove(patient_id)?;
        let cancelled = self.appointments.remove_where(|a| a.patient_id == patient_id);

        let saved = self.persist(&self.patients).await;
        let saved_appointments = if cancelled > 0 {
            self.persist(&self.appointments).await
        } else {
            Ok(())
        };
        saved.and(saved_appointments)?;

        info!("Deleted patient {} and {} appointment(s)", patient_id, cancelled);
        Ok(patient)
    }

    // ---- 医生 ----

    pub async fn add_doctor(&mut self, doctor: Doctor) -> Result<Doctor> {
        require_non_empty("doctor name", &doctor.name)?;

        self.doctors.insert(doctor.clone())?;
        self.persist(&self.doctors).await?;

        info!("Added doctor {} ({})", doctor.doctor_id, doctor.name);
        Ok(doctor)
    }

    pub fn doctors(&self) -> &[Doctor] {
        self.doctors.list()
    }

    pub fn get_doctor(&self, doctor_id: &str) -> Option<&Doctor> {
        self.doctors.get(doctor_id)
    }

    pub fn search_doctors(&self, query: &str) -> Vec<&Doctor> {
        self.doctors.search(query)
    }

    /// 删除医生，并删除该医生的所有预约
    pub async fn delete_doctor(&mut self, doctor_id: &str) -> Result<Doctor> {
        let doctor = self.doctors.remove(doctor_id)?;
        let cancelled = self.appointments.remove_where(|a| a.doctor_id == doctor_id);

        let saved = self.persist(&self.doctors).await;
        let saved_appointments = if cancelled > 0 {
            self.persist(&self.appointments).await
        } else {
            Ok(())
        };
        saved.and(saved_appointments)?;

        info!("Deleted doctor {} and {} appointment(s)", doctor_id, cancelled);
        Ok(doctor)
    }

    // ---- 预约 ----

    /// 创建预约
    ///
    /// 患者和医生必须存在，时间必须为 `YYYY-MM-DD HH:MM`，同一医生同一时间只能有一个预约。
    pub async fn schedule_appointment(&mut self, mut appointment: Appointment) -> Result<Appointment> {
        if !self.patients.contains(&appointment.patient_id) {
            return Err(HospitalError::not_found(RecordKind::Patient, &appointment.patient_id));
        }
        if !self.doctors.contains(&appointment.doctor_id) {
            return Err(HospitalError::not_found(RecordKind::Doctor, &appointment.doctor_id));
        }

        appointment.date_time = parse_appointment_time(&appointment.date_time)?;

        let double_booked = self
            .appointments
            .list()
            .iter()
            .any(|a| a.doctor_id == appointment.doctor_id && a.date_time == appointment.date_time);
        if double_booked {
            return Err(HospitalError::Validation(format!(
                "doctor {} already has an appointment at {}",
                appointment.doctor_id, appointment.date_time
            )));
        }

        self.appointments.insert(appointment.clone())?;
        self.persist(&self.appointments).await?;

        info!(
            "Scheduled appointment {} for patient {} with doctor {} at {}",
            appointment.appointment_id, appointment.patient_id, appointment.doctor_id, appointment.date_time
        );
        Ok(appointment)
    }

    pub fn appointments(&self) -> &[Appointment] {
        self.appointments.list()
    }

    pub fn get_appointment(&self, appointment_id: &str) -> Option<&Appointment> {
        self.appointments.get(appointment_id)
    }

    pub fn search_appointments(&self, query: &str) -> Vec<&Appointment> {
        self.appointments.search(query)
    }

    /// 按时间排序的患者预约
    pub fn appointments_for_patient(&self, patient_id: &str) -> Vec<&Appointment> {
        let mut found = self.appointments.filter(|a| a.patient_id == patient_id);
        found.sort_by(|a, b| a.date_time.cmp(&b.date_time));
        found
    }

    /// 按时间排序的医生预约
    pub fn appointments_for_doctor(&self, doctor_id: &str) -> Vec<&Appointment> {
        let mut found = self.appointments.filter(|a| a.doctor_id == doctor_id);
        found.sort_by(|a, b| a.date_time.cmp(&b.date_time));
        found
    }

    pub async fn cancel_appointment(&mut self, appointment_id: &str) -> Result<Appointment> {
        let appointment = self.appointments.remove(appointment_id)?;
        self.persist(&self.appointments).await?;

        info!("Cancelled appointment {}", appointment_id);
        Ok(appointment)
    }

    // ---- 病历 ----

    pub async fn add_medical_record(&mut self, record: MedicalRecord) -> Result<MedicalRecord> {
        if !self.patients.contains(&record.patient_id) {
            return Err(HospitalError::not_found(RecordKind::Patient, &record.patient_id));
        }
        require_non_empty("diagnosis", &record.diagnosis)?;

        self.records.insert(record.clone())?;
        self.persist(&self.records).await?;

        info!("Added medical record {} for patient {}", record.record_id, record.patient_id);
        Ok(record)
    }

    pub fn medical_records(&self) -> &[MedicalRecord] {
        self.records.list()
    }

    pub fn get_medical_record(&self, record_id: &str) -> Option<&MedicalRecord> {
        self.records.get(record_id)
    }

    pub fn search_medical_records(&self, query: &str) -> Vec<&MedicalRecord> {
        self.records.search(query)
    }

    pub fn records_for_patient(&self, patient_id: &str) -> Vec<&MedicalRecord> {
        self.records.filter(|r| r.patient_id == patient_id)
    }

    pub async fn delete_medical_record(&mut self, record_id: &str) -> Result<MedicalRecord> {
        let record = self.records.remove(record_id)?;
        self.persist(&self.records).await?;

        info!("Deleted medical record {}", record_id);
        Ok(record)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HospitalError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
