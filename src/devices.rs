//! Local device board: pump, aerator, light, filter, feeder, heater.
//!
//! Toggling only flips in-memory state. Nothing is sent to hardware; a real
//! actuator interface would sit behind these methods.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Pump,
    Aerator,
    Light,
    Filter,
    Feeder,
    Heater,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    // ---
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub is_on: bool,
    pub description: String,
    /// Rated draw in watts while on.
    pub power_watts: u32,
    pub schedule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_feed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub devices: Vec<Device>,
    pub active: usize,
    pub total_power_watts: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceBoard {
    devices: Vec<Device>,
}

fn device(
    id: u32,
    name: &str,
    kind: DeviceKind,
    is_on: bool,
    description: &str,
    power_watts: u32,
    schedule: &str,
) -> Device {
    Device {
        id,
        name: name.to_string(),
        kind,
        is_on,
        description: description.to_string(),
        power_watts,
        schedule: schedule.to_string(),
        last_feed: None,
    }
}

impl DeviceBoard {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// The aquarium's stock equipment.
    pub fn seeded() -> Self {
        // ---
        Self::new(vec![
            device(1, "Máy bơm nước chính", DeviceKind::Pump, true,
                "Bơm nước tuần hoàn cho hồ cá", 150, "Tự động theo mực nước"),
            device(2, "Máy sục khí", DeviceKind::Aerator, false,
                "Cung cấp oxy cho hồ cá", 85, "6h-18h hàng ngày"),
            device(3, "Đèn LED chiếu sáng", DeviceKind::Light, true,
                "Chiếu sáng cho hồ cá", 40, "18h-6h hàng ngày"),
            device(4, "Hệ thống lọc nước", DeviceKind::Filter, true,
                "Lọc và làm sạch nước hồ", 120, "Hoạt động liên tục"),
            device(5, "Bộ cho ăn tự động", DeviceKind::Feeder, true,
                "Cho cá ăn tự động theo lịch", 15, "8h, 12h, 18h hàng ngày"),
            device(6, "Máy sưởi nước", DeviceKind::Heater, false,
                "Duy trì nhiệt độ nước ổn định", 200, "Tự động khi nhiệt độ < 25°C"),
        ])
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Flip one device by id.
    pub fn toggle(&mut self, id: u32) -> Option<&Device> {
        // ---
        let device = self.devices.iter_mut().find(|d| d.id == id)?;
        device.is_on = !device.is_on;
        tracing::info!("Device {} ({}) switched {}", device.id, device.name, on_off(device.is_on));
        Some(device)
    }

    /// Flip every device of `kind`; returns how many changed.
    pub fn toggle_kind(&mut self, kind: DeviceKind) -> usize {
        // ---
        let mut changed = 0;
        for device in self.devices.iter_mut().filter(|d| d.kind == kind) {
            device.is_on = !device.is_on;
            changed += 1;
        }
        changed
    }

    /// Record a manual feeding on every feeder.
    pub fn feed_now(&mut self, now: DateTime<Utc>) -> usize {
        // ---
        let mut fed = 0;
        for feeder in self.devices.iter_mut().filter(|d| d.kind == DeviceKind::Feeder) {
            feeder.last_feed = Some(now);
            fed += 1;
        }
        fed
    }

    pub fn active_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_on).count()
    }

    pub fn total_power_watts(&self) -> u32 {
        self.devices.iter().filter(|d| d.is_on).map(|d| d.power_watts).sum()
    }

    pub fn summary(&self) -> DeviceSummary {
        // ---
        DeviceSummary {
            devices: self.devices().to_vec(),
            active: self.active_count(),
            total_power_watts: self.total_power_watts(),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
