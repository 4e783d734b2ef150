//! Code tables for Win32_Processor properties
//!
//! The management service reports most processor attributes as small integer
//! codes. Each table below maps those codes to the text documented for the
//! `Win32_Processor` class. Lookups are total: a code missing from a table
//! yields `None`, never an error.

/// Look up `code` in a `(code, value)` table
fn lookup<T: Copy>(table: &[(u32, T)], code: u32) -> Option<T> {
    table
        .iter()
        .find_map(|&(key, value)| (key == code).then_some(value))
}

/// `Architecture`
pub static ARCHITECTURE: &[(u32, &str)] = &[
    (0, "x86"),
    (1, "MIPS"),
    (2, "Alpha"),
    (3, "PowerPC"),
    (6, "IA64"),
    (9, "x64"),
];

/// `Availability`
pub static AVAILABILITY: &[(u32, &str)] = &[
    (1, "Other"),
    (2, "Unknown"),
    (3, "Running"),
    (4, "Warning"),
    (5, "In Test"),
    (6, "Not Applicable"),
    (7, "Power Off"),
    (8, "Off Line"),
    (9, "Off Duty"),
    (10, "Degraded"),
    (11, "Not Installed"),
    (12, "Install Error"),
    (13, "Power Save - Unknown"),
    (14, "Power Save - Low Power Mode"),
    (15, "Power Save - Standby"),
    (16, "Power Cycle"),
    (17, "Power Save - Warning"),
    (18, "Paused"),
    (19, "Not Ready"),
    (20, "Not Configured"),
    (21, "Quiesced"),
];

/// `CpuStatus`. Codes 5 and 6 are reserved.
pub static CPU_STATUS: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Enabled"),
    (2, "Disabled by User via BIOS Setup"),
    (3, "Disabled By BIOS (POST Error)"),
    (4, "Idle"),
    (7, "Other"),
];

/// `StatusInfo`
pub static STATUS_INFO: &[(u32, &str)] = &[
    (1, "Other"),
    (2, "Unknown"),
    (3, "Enabled"),
    (4, "Disabled"),
    (5, "Not Applicable"),
];

/// `ConfigManagerErrorCode`, codes 0 through 31
pub static CONFIG_MANAGER_ERROR_CODE: &[(u32, &str)] = &[
    (0, "The device is working properly."),
    (1, "The device is not configured correctly."),
    (2, "Windows cannot load the driver for the device."),
    (3, "The driver for the device might be corrupted, or the system may be running low on memory or other resources."),
    (4, "The device is not working properly. One of the drivers or the registry might be corrupted."),
    (5, "The driver for this device needs a resource that Windows cannot manage."),
    (6, "The boot configuration for this device conflicts with other devices."),
    (7, "Cannot filter."),
    (8, "The driver loader for the device is missing."),
    (9, "This device is not working properly because the controlling firmware is reporting the resources for the device incorrectly."),
    (10, "This device cannot start."),
    (11, "This device failed."),
    (12, "This device cannot find enough free resources that it can use."),
    (13, "Windows cannot verify this device's resources."),
    (14, "This device cannot work properly until you restart your computer."),
    (15, "This device is not working properly because there is probably a re-enumeration problem."),
    (16, "Windows cannot identify all the resources this device uses."),
    (17, "This device is asking for an unknown resource type."),
    (18, "Reinstall the drivers for this device."),
    (19, "Failure using the VXD loader."),
    (20, "Your registry might be corrupted."),
    (21, "System failure: try changing the driver for this device. If that does not work, see your hardware documentation. Windows is removing this device."),
    (22, "This device is disabled."),
    (23, "System failure: try changing the driver for this device. If that doesn't work, see your hardware documentation."),
    (24, "This device is not present, not working properly, or does not have all its drivers installed."),
    (25, "Windows is still setting up this device."),
    (26, "Windows is still setting up this device."),
    (27, "This device does not have valid log configuration."),
    (28, "The drivers for this device are not installed."),
    (29, "This device is disabled because the firmware of the device did not give it the required resources."),
    (30, "This device is using an Interrupt Request (IRQ) resource that another device is using."),
    (31, "This device is not working properly because Windows cannot load the drivers required for this device."),
];

/// `Family`
///
/// Names are the full ones from the `Win32_Processor` class documentation,
/// e.g. 120 is `Crusoe(TM) TM5000 Family` and 176 is `Pentium(R) III
/// Xeon(TM)`, not shortened forms such as `Crusoe?` or `Pentium?`. Older
/// tooling that matched on the shortened strings will not match these.
pub static FAMILY: &[(u32, &str)] = &[
    (1, "Other"),
    (2, "Unknown"),
    (3, "8086"),
    (4, "80286"),
    (5, "80386"),
    (6, "80486"),
    (7, "8087"),
    (8, "80287"),
    (9, "80387"),
    (10, "80487"),
    (11, "Pentium(R) brand"),
    (12, "Pentium(R) Pro"),
    (13, "Pentium(R) II"),
    (14, "Pentium(R) processor with MMX(TM) technology"),
    (15, "Celeron(TM)"),
    (16, "Pentium(R) II Xeon(TM)"),
    (17, "Pentium(R) III"),
    (18, "M1 Family"),
    (19, "M2 Family"),
    (24, "K5 Family"),
    (25, "K6 Family"),
    (26, "K6-2"),
    (27, "K6-3"),
    (28, "AMD Athlon(TM) Processor Family"),
    (29, "AMD(R) Duron(TM) Processor"),
    (30, "AMD29000 Family"),
    (31, "K6-2+"),
    (32, "Power PC Family"),
    (33, "Power PC 601"),
    (34, "Power PC 603"),
    (35, "Power PC 603+"),
    (36, "Power PC 604"),
    (37, "Power PC 620"),
    (38, "Power PC X704"),
    (39, "Power PC 750"),
    (48, "Alpha Family"),
    (49, "Alpha 21064"),
    (50, "Alpha 21066"),
    (51, "Alpha 21164"),
    (52, "Alpha 21164PC"),
    (53, "Alpha 21164a"),
    (54, "Alpha 21264"),
    (55, "Alpha 21364"),
    (64, "MIPS Family"),
    (65, "MIPS R4000"),
    (66, "MIPS R4200"),
    (67, "MIPS R4400"),
    (68, "MIPS R4600"),
    (69, "MIPS R10000"),
    (80, "SPARC Family"),
    (81, "SuperSPARC"),
    (82, "microSPARC II"),
    (83, "microSPARC IIep"),
    (84, "UltraSPARC"),
    (85, "UltraSPARC II"),
    (86, "UltraSPARC IIi"),
    (87, "UltraSPARC III"),
    (88, "UltraSPARC IIIi"),
    (96, "68040"),
    (97, "68xxx Family"),
    (98, "68000"),
    (99, "68010"),
    (100, "68020"),
    (101, "68030"),
    (112, "Hobbit Family"),
    (120, "Crusoe(TM) TM5000 Family"),
    (121, "Crusoe(TM) TM3000 Family"),
    (128, "Weitek"),
    (130, "Itanium(TM) Processor"),
    (144, "PA-RISC Family"),
    (145, "PA-RISC 8500"),
    (146, "PA-RISC 8000"),
    (147, "PA-RISC 7300LC"),
    (148, "PA-RISC 7200"),
    (149, "PA-RISC 7100LC"),
    (150, "PA-RISC 7100"),
    (160, "V30 Family"),
    (176, "Pentium(R) III Xeon(TM)"),
    (177, "Pentium(R) III Processor with Intel(R) SpeedStep(TM) Technology"),
    (178, "Pentium(R) 4"),
    (179, "Intel(R) Xeon(TM)"),
    (180, "AS400 Family"),
    (181, "Intel(R) Xeon(TM) processor MP"),
    (182, "AMD AthlonXP(TM) Family"),
    (183, "AMD AthlonMP(TM) Family"),
    (184, "Intel(R) Itanium(R) 2"),
    (185, "AMD Opteron(TM) Family"),
    (190, "K7"),
    (200, "IBM390 Family"),
    (201, "G4"),
    (202, "G5"),
    (250, "i860"),
    (251, "i960"),
    (260, "SH-3"),
    (261, "SH-4"),
    (280, "ARM"),
    (281, "StrongARM"),
    (300, "6x86"),
    (301, "MediaGX"),
    (302, "MII"),
    (320, "WinChip"),
    (350, "DSP"),
    (500, "Video Processor"),
];

/// `PowerManagementCapabilities` (one code per array element)
pub static POWER_MANAGEMENT_CAPABILITY: &[(u32, &str)] = &[
    (0, "Unknown"),
    (1, "Not Supported"),
    (2, "Disabled"),
    (3, "Enabled"),
    (4, "Power Saving Modes Entered Automatically"),
    (5, "Power State Settable"),
    (6, "Power Cycling Supported"),
    (7, "Timed Power On Supported"),
];

/// `ProcessorType`
pub static PROCESSOR_TYPE: &[(u32, &str)] = &[
    (1, "Other"),
    (2, "Unknown"),
    (3, "Central Processor"),
    (4, "Math Processor"),
    (5, "DSP Processor"),
    (6, "Video Processor"),
];

/// `UpgradeMethod`
pub static UPGRADE_METHOD: &[(u32, &str)] = &[
    (1, "Other"),
    (2, "Unknown"),
    (3, "Daughter Board"),
    (4, "ZIF Socket"),
    (5, "Replacement/Piggy Back"),
    (6, "None"),
    (7, "LIF Socket"),
    (8, "Slot 1"),
    (9, "Slot 2"),
    (10, "370 Pin Socket"),
    (11, "Slot A"),
    (12, "Slot M"),
];

/// `VoltageCaps`, in volts
pub static VOLTAGE_CAPS: &[(u32, f32)] = &[(1, 5.0), (2, 3.3), (4, 2.9)];

pub fn architecture(code: u32) -> Option<&'static str> {
    lookup(ARCHITECTURE, code)
}

pub fn availability(code: u32) -> Option<&'static str> {
    lookup(AVAILABILITY, code)
}

pub fn cpu_status(code: u32) -> Option<&'static str> {
    lookup(CPU_STATUS, code)
}

pub fn status_info(code: u32) -> Option<&'static str> {
    lookup(STATUS_INFO, code)
}

pub fn config_manager_error_code(code: u32) -> Option<&'static str> {
    lookup(CONFIG_MANAGER_ERROR_CODE, code)
}

pub fn family(code: u32) -> Option<&'static str> {
    lookup(FAMILY, code)
}

pub fn power_management_capability(code: u32) -> Option<&'static str> {
    lookup(POWER_MANAGEMENT_CAPABILITY, code)
}

pub fn processor_type(code: u32) -> Option<&'static str> {
    lookup(PROCESSOR_TYPE, code)
}

pub fn upgrade_method(code: u32) -> Option<&'static str> {
    lookup(UPGRADE_METHOD, code)
}

/// Supported voltage in volts; only the single-bit codes 1, 2 and 4 are mapped
pub fn voltage_caps(code: u32) -> Option<f32> {
    lookup(VOLTAGE_CAPS, code)
}
