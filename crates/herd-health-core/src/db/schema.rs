//! SQLite schema definition.

/// Complete database schema for herd health records.
///
/// Timestamps are fixed-width RFC 3339 UTC strings (see `to_db_time`), so
/// range predicates compare them as text.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medical Records (consultations)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_records (
    id TEXT PRIMARY KEY,
    bovine_id TEXT NOT NULL,
    consultation_type TEXT NOT NULL,
    consultation_date TEXT NOT NULL,
    location TEXT,                               -- JSON object {latitude, longitude, address}
    diagnosis TEXT,
    notes TEXT,
    recorded_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_bovine_date ON medical_records(bovine_id, consultation_date);

CREATE TABLE IF NOT EXISTS record_medications (
    line_id INTEGER PRIMARY KEY AUTOINCREMENT,
    health_record_id TEXT NOT NULL REFERENCES medical_records(id),
    medication_id TEXT NOT NULL,
    dosage REAL NOT NULL CHECK (dosage > 0),
    cost REAL NOT NULL CHECK (cost >= 0)
);

CREATE INDEX IF NOT EXISTS idx_record_medications_record ON record_medications(health_record_id);

-- ============================================================================
-- Vaccinations
-- ============================================================================

CREATE TABLE IF NOT EXISTS vaccinations (
    id TEXT PRIMARY KEY,
    bovine_id TEXT NOT NULL,
    vaccine_id TEXT NOT NULL,
    vaccine_name TEXT NOT NULL,
    administration_date TEXT NOT NULL,
    location TEXT NOT NULL,                      -- JSON object, always present
    dose_quantity REAL NOT NULL DEFAULT 1,
    batch_number TEXT,
    next_due_date TEXT CHECK (next_due_date IS NULL OR next_due_date > administration_date),
    status TEXT NOT NULL CHECK (status IN ('scheduled', 'completed', 'overdue', 'cancelled', 'rescheduled')),
    recorded_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Duplicate-window lookups
CREATE INDEX IF NOT EXISTS idx_vaccinations_window ON vaccinations(bovine_id, vaccine_id, administration_date);
-- Due scans
CREATE INDEX IF NOT EXISTS idx_vaccinations_due ON vaccinations(status, next_due_date);

-- ============================================================================
-- Treatment Plans
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatment_plans (
    id TEXT PRIMARY KEY,
    bovine_id TEXT NOT NULL,
    diagnosis TEXT,
    medications TEXT NOT NULL DEFAULT '[]',      -- JSON array of MedicationLine
    total_cost REAL NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('planned', 'active', 'completed', 'suspended', 'cancelled')),
    start_date TEXT NOT NULL,
    next_checkup TEXT,
    recorded_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_treatments_bovine_start ON treatment_plans(bovine_id, start_date);
CREATE INDEX IF NOT EXISTS idx_treatments_checkup ON treatment_plans(status, next_checkup);

-- ============================================================================
-- Disease Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS disease_records (
    id TEXT PRIMARY KEY,
    bovine_id TEXT NOT NULL,
    disease_name TEXT NOT NULL,
    severity TEXT NOT NULL CHECK (severity IN ('mild', 'moderate', 'severe', 'critical')),
    status TEXT NOT NULL,
    detection_date TEXT NOT NULL,
    is_contagious INTEGER NOT NULL DEFAULT 0,
    is_reportable INTEGER NOT NULL DEFAULT 0,
    quarantine_required INTEGER NOT NULL DEFAULT 0,
    quarantine_end_date TEXT,
    recorded_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_diseases_bovine_detection ON disease_records(bovine_id, detection_date);

-- ============================================================================
-- Health Alerts
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_alerts (
    id TEXT PRIMARY KEY,
    dedupe_key TEXT NOT NULL UNIQUE,             -- alert_type:related_record_id:due_date
    bovine_id TEXT NOT NULL,
    alert_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    details TEXT NOT NULL DEFAULT '{}',          -- JSON object
    trigger_date TEXT NOT NULL,
    due_date TEXT,
    is_resolved INTEGER NOT NULL DEFAULT 0,
    notification_sent INTEGER NOT NULL DEFAULT 0,
    related_record_id TEXT NOT NULL,
    actions TEXT NOT NULL DEFAULT '[]'           -- JSON array of strings
);

CREATE INDEX IF NOT EXISTS idx_alerts_bovine ON health_alerts(bovine_id, is_resolved);
CREATE INDEX IF NOT EXISTS idx_alerts_pending ON health_alerts(notification_sent, is_resolved);

-- Resolution and notification flags only move forward
CREATE TRIGGER IF NOT EXISTS health_alerts_flags_forward BEFORE UPDATE ON health_alerts
WHEN (old.notification_sent = 1 AND new.notification_sent = 0)
  OR (old.is_resolved = 1 AND new.is_resolved = 0)
BEGIN
    SELECT RAISE(ABORT, 'Alert flags cannot be cleared');
END;

-- ============================================================================
-- Append-only guards
-- ============================================================================

CREATE TRIGGER IF NOT EXISTS medical_records_no_delete BEFORE DELETE ON medical_records
BEGIN
    SELECT RAISE(ABORT, 'Medical records are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS vaccinations_no_delete BEFORE DELETE ON vaccinations
BEGIN
    SELECT RAISE(ABORT, 'Vaccinations are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS vaccinations_administration_fixed BEFORE UPDATE OF administration_date ON vaccinations
WHEN new.administration_date <> old.administration_date
BEGIN
    SELECT RAISE(ABORT, 'Administration date cannot be rewritten');
END;

CREATE TRIGGER IF NOT EXISTS treatment_plans_no_delete BEFORE DELETE ON treatment_plans
BEGIN
    SELECT RAISE(ABORT, 'Treatment plans are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS disease_records_no_delete BEFORE DELETE ON disease_records
BEGIN
    SELECT RAISE(ABORT, 'Disease records are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS health_alerts_no_delete BEFORE DELETE ON health_alerts
BEGIN
    SELECT RAISE(ABORT, 'Alerts are never deleted');
END;
"#;
