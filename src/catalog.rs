//! Catalog of the logical fields extracted from every telemetry fetch.
//!
//! Each [`KeyField`] maps to exactly one [`Lookup`] through an exhaustive match, so adding a field
//! without saying where it comes from does not compile.

use num_derive::FromPrimitive;

/// Where a logical field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Candidate feature names in precedence order, then case-insensitive substring patterns.
    Find {
        keys: &'static [&'static str],
        patterns: &'static [&'static str],
    },
    /// A named property of a compound feature.
    Nested {
        feature: &'static str,
        property: &'static str,
    },
}

const fn keys(keys: &'static [&'static str]) -> Lookup {
    Lookup::Find { keys, patterns: &[] }
}

const fn nested(feature: &'static str, property: &'static str) -> Lookup {
    Lookup::Nested { feature, property }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive)]
pub enum KeyField {
    /* temperatures */
    OutsideTemp,
    CalculatedOutsideTemp,
    SupplyTemp,
    ReturnTemp,
    PrimarySupplyTemp,
    PrimaryReturnTemp,
    SecondarySupplyTemp,
    SecondaryReturnTemp,
    CommonSupplyTemp,
    BufferTemp,
    BufferTempTop,
    BoilerTemp,
    RoomTemp,
    OutsideHumidity,
    RoomHumidity,
    /* domestic hot water */
    DhwTemp,
    DhwTempTop,
    DhwTempBottom,
    DhwOutletTemp,
    DhwTarget,
    DhwTarget2,
    DhwHysteresisOn,
    DhwHysteresisOff,
    DhwOperatingMode,
    DhwStatus,
    DhwCirculationPump,
    DhwChargingPump,
    SolarCollectorTemp,
    SolarStorageTemp,
    /* heating curve */
    HeatingCurveSlope,
    HeatingCurveShift,
    SupplyTempMin,
    SupplyTempMax,
    /* operation */
    OperatingMode,
    OperatingProgram,
    CircuitName,
    CircuitPump,
    FrostProtection,
    HolidayActive,
    NoiseReduction,
    /* compressor */
    CompressorActive,
    CompressorPhase,
    CompressorSpeed,
    CompressorPower,
    CompressorCurrent,
    CompressorInletPressure,
    CompressorInletTemp,
    CompressorOutletTemp,
    CompressorOilTemp,
    CompressorMotorTemp,
    CompressorHours,
    CompressorStarts,
    CompressorStats,
    /* burner */
    BurnerActive,
    BurnerModulation,
    BurnerHours,
    BurnerStarts,
    /* auxiliary sensors */
    VolumetricFlow,
    SupplyPressure,
    InternalPump,
    Fan0,
    Fan1,
    /* efficiency */
    CopTotal,
    CopHeating,
    CopDhw,
    CopCooling,
    /* valves and secondary heat */
    FourWayValve,
    DiverterValve,
    SecondaryHeater,
    HeatingRod,
    /* refrigerant circuit */
    EvaporatorTemp,
    EvaporatorOverheat,
    CondenserTemp,
    EconomizerTemp,
    InverterTemp,
    /* identity */
    DeviceName,
    DeviceSerial,
    ControllerSerial,
    ProductIdentification,
}

pub const KEY_FIELD_COUNT: usize = KeyField::ProductIdentification as usize + 1;

impl KeyField {
    pub fn all() -> impl Iterator<Item = KeyField> {
        (0..KEY_FIELD_COUNT).filter_map(num::FromPrimitive::from_usize)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Logical name used by consumers of the record.
    pub fn name(self) -> &'static str {
        match self {
            KeyField::OutsideTemp => "outsideTemp",
            KeyField::CalculatedOutsideTemp => "calculatedOutsideTemp",
            KeyField::SupplyTemp => "supplyTemp",
            KeyField::ReturnTemp => "returnTemp",
            KeyField::PrimarySupplyTemp => "primarySupplyTemp",
            KeyField::PrimaryReturnTemp => "primaryReturnTemp",
            KeyField::SecondarySupplyTemp => "secondarySupplyTemp",
            KeyField::SecondaryReturnTemp => "secondaryReturnTemp",
            KeyField::CommonSupplyTemp => "commonSupplyTemp",
            KeyField::BufferTemp => "bufferTemp",
            KeyField::BufferTempTop => "bufferTempTop",
            KeyField::BoilerTemp => "boilerTemp",
            KeyField::RoomTemp => "roomTemp",
            KeyField::OutsideHumidity => "outsideHumidity",
            KeyField::RoomHumidity => "roomHumidity",
            KeyField::DhwTemp => "dhwTemp",
            KeyField::DhwTempTop => "dhwTempTop",
            KeyField::DhwTempBottom => "dhwTempBottom",
            KeyField::DhwOutletTemp => "dhwOutletTemp",
            KeyField::DhwTarget => "dhwTarget",
            KeyField::DhwTarget2 => "dhwTarget2",
            KeyField::DhwHysteresisOn => "dhwHysteresisOn",
            KeyField::DhwHysteresisOff => "dhwHysteresisOff",
            KeyField::DhwOperatingMode => "dhwOperatingMode",
            KeyField::DhwStatus => "dhwStatus",
            KeyField::DhwCirculationPump => "dhwCirculationPump",
            KeyField::DhwChargingPump => "dhwChargingPump",
            KeyField::SolarCollectorTemp => "solarCollectorTemp",
            KeyField::SolarStorageTemp => "solarStorageTemp",
            KeyField::HeatingCurveSlope => "heatingCurveSlope",
            KeyField::HeatingCurveShift => "heatingCurveShift",
            KeyField::SupplyTempMin => "supplyTempMin",
            KeyField::SupplyTempMax => "supplyTempMax",
            KeyField::OperatingMode => "operatingMode",
            KeyField::OperatingProgram => "operatingProgram",
            KeyField::CircuitName => "circuitName",
            KeyField::CircuitPump => "circuitPump",
            KeyField::FrostProtection => "frostProtection",
            KeyField::HolidayActive => "holidayActive",
            KeyField::NoiseReduction => "noiseReduction",
            KeyField::CompressorActive => "compressorActive",
            KeyField::CompressorPhase => "compressorPhase",
            KeyField::CompressorSpeed => "compressorSpeed",
            KeyField::CompressorPower => "compressorPower",
            KeyField::CompressorCurrent => "compressorCurrent",
            KeyField::CompressorInletPressure => "compressorInletPressure",
            KeyField::CompressorInletTemp => "compressorInletTemp",
            KeyField::CompressorOutletTemp => "compressorOutletTemp",
            KeyField::CompressorOilTemp => "compressorOilTemp",
            KeyField::CompressorMotorTemp => "compressorMotorTemp",
            KeyField::CompressorHours => "compressorHours",
            KeyField::CompressorStarts => "compressorStarts",
            KeyField::CompressorStats => "compressorStats",
            KeyField::BurnerActive => "burnerActive",
            KeyField::BurnerModulation => "burnerModulation",
            KeyField::BurnerHours => "burnerHours",
            KeyField::BurnerStarts => "burnerStarts",
            KeyField::VolumetricFlow => "volumetricFlow",
            KeyField::SupplyPressure => "supplyPressure",
            KeyField::InternalPump => "internalPump",
            KeyField::Fan0 => "fan0",
            KeyField::Fan1 => "fan1",
            KeyField::CopTotal => "copTotal",
            KeyField::CopHeating => "copHeating",
            KeyField::CopDhw => "copDhw",
            KeyField::CopCooling => "copCooling",
            KeyField::FourWayValve => "fourWayValve",
            KeyField::DiverterValve => "diverterValve",
            KeyField::SecondaryHeater => "secondaryHeater",
            KeyField::HeatingRod => "heatingRod",
            KeyField::EvaporatorTemp => "evaporatorTemp",
            KeyField::EvaporatorOverheat => "evaporatorOverheat",
            KeyField::CondenserTemp => "condenserTemp",
            KeyField::EconomizerTemp => "economizerTemp",
            KeyField::InverterTemp => "inverterTemp",
            KeyField::DeviceName => "deviceName",
            KeyField::DeviceSerial => "deviceSerial",
            KeyField::ControllerSerial => "controllerSerial",
            KeyField::ProductIdentification => "productIdentification",
        }
    }

    pub fn lookup(self) -> Lookup {
        match self {
            KeyField::OutsideTemp => Lookup::Find {
                keys: &["heating.sensors.temperature.outside"],
                patterns: &["temperature.outside"],
            },
            KeyField::CalculatedOutsideTemp => keys(&["heating.calculated.temperature.outside"]),
            KeyField::SupplyTemp => keys(&[
                "heating.circuits.0.sensors.temperature.supply",
                "heating.boiler.sensors.temperature.commonSupply",
            ]),
            KeyField::ReturnTemp => keys(&[
                "heating.sensors.temperature.return",
                "heating.circuits.0.sensors.temperature.return",
            ]),
            KeyField::PrimarySupplyTemp => keys(&["heating.primaryCircuit.sensors.temperature.supply"]),
            KeyField::PrimaryReturnTemp => keys(&["heating.primaryCircuit.sensors.temperature.return"]),
            KeyField::SecondarySupplyTemp => {
                keys(&["heating.secondaryCircuit.sensors.temperature.supply"])
            }
            KeyField::SecondaryReturnTemp => {
                keys(&["heating.secondaryCircuit.sensors.temperature.return"])
            }
            KeyField::CommonSupplyTemp => keys(&["heating.boiler.sensors.temperature.commonSupply"]),
            KeyField::BufferTemp => keys(&[
                "heating.bufferCylinder.sensors.temperature.main",
                "heating.buffer.sensors.temperature.main",
            ]),
            KeyField::BufferTempTop => keys(&[
                "heating.bufferCylinder.sensors.temperature.top",
                "heating.buffer.sensors.temperature.top",
            ]),
            KeyField::BoilerTemp => keys(&["heating.boiler.sensors.temperature.main"]),
            KeyField::RoomTemp => keys(&["heating.circuits.0.sensors.temperature.room"]),
            KeyField::OutsideHumidity => keys(&["heating.sensors.humidity.outside"]),
            KeyField::RoomHumidity => keys(&["heating.circuits.0.sensors.humidity.room"]),
            KeyField::DhwTemp => Lookup::Find {
                keys: &[
                    "heating.dhw.sensors.temperature.hotWaterStorage",
                    "heating.dhw.sensors.temperature.dhwCylinder",
                ],
                patterns: &["hotWaterStorage"],
            },
            KeyField::DhwTempTop => keys(&[
                "heating.dhw.sensors.temperature.hotWaterStorage.top",
                "heating.dhw.sensors.temperature.dhwCylinder.top",
            ]),
            KeyField::DhwTempBottom => keys(&[
                "heating.dhw.sensors.temperature.hotWaterStorage.bottom",
                "heating.dhw.sensors.temperature.dhwCylinder.bottom",
            ]),
            KeyField::DhwOutletTemp => keys(&["heating.dhw.sensors.temperature.outlet"]),
            KeyField::DhwTarget => keys(&["heating.dhw.temperature.main"]),
            KeyField::DhwTarget2 => keys(&["heating.dhw.temperature.temp2"]),
            KeyField::DhwHysteresisOn => nested("heating.dhw.temperature.hysteresis", "switchOnValue"),
            KeyField::DhwHysteresisOff => {
                nested("heating.dhw.temperature.hysteresis", "switchOffValue")
            }
            KeyField::DhwOperatingMode => keys(&["heating.dhw.operating.modes.active"]),
            KeyField::DhwStatus => nested("heating.dhw", "status"),
            KeyField::DhwCirculationPump => nested("heating.dhw.pumps.circulation", "status"),
            KeyField::DhwChargingPump => nested("heating.dhw.pumps.primary", "status"),
            KeyField::SolarCollectorTemp => keys(&["heating.solar.sensors.temperature.collector"]),
            KeyField::SolarStorageTemp => keys(&["heating.solar.sensors.temperature.dhw"]),
            KeyField::HeatingCurveSlope => nested("heating.circuits.0.heating.curve", "slope"),
            KeyField::HeatingCurveShift => nested("heating.circuits.0.heating.curve", "shift"),
            KeyField::SupplyTempMin => nested("heating.circuits.0.temperature.levels", "min"),
            KeyField::SupplyTempMax => nested("heating.circuits.0.temperature.levels", "max"),
            KeyField::OperatingMode => keys(&["heating.circuits.0.operating.modes.active"]),
            KeyField::OperatingProgram => keys(&["heating.circuits.0.operating.programs.active"]),
            KeyField::CircuitName => nested("heating.circuits.0", "name"),
            KeyField::CircuitPump => nested("heating.circuits.0.circulation.pump", "status"),
            KeyField::FrostProtection => nested("heating.circuits.0.frostprotection", "status"),
            KeyField::HolidayActive => nested("heating.operating.programs.holiday", "active"),
            KeyField::NoiseReduction => {
                keys(&["heating.noise.reduction.operating.programs.active"])
            }
            KeyField::CompressorActive => nested("heating.compressors.0", "active"),
            KeyField::CompressorPhase => nested("heating.compressors.0", "phase"),
            KeyField::CompressorSpeed => Lookup::Find {
                keys: &["heating.compressors.0.speed.current"],
                patterns: &["compressors.0.speed"],
            },
            KeyField::CompressorPower => keys(&[
                "heating.inverters.0.sensors.power.output",
                "heating.compressors.0.power.consumption.current",
            ]),
            KeyField::CompressorCurrent => keys(&["heating.inverters.0.sensors.power.current"]),
            KeyField::CompressorInletPressure => {
                keys(&["heating.compressors.0.sensors.pressure.inlet"])
            }
            KeyField::CompressorInletTemp => keys(&["heating.compressors.0.sensors.temperature.inlet"]),
            KeyField::CompressorOutletTemp => {
                keys(&["heating.compressors.0.sensors.temperature.outlet"])
            }
            KeyField::CompressorOilTemp => keys(&["heating.compressors.0.sensors.temperature.oil"]),
            KeyField::CompressorMotorTemp => {
                keys(&["heating.compressors.0.sensors.temperature.motorChamber"])
            }
            KeyField::CompressorHours => nested("heating.compressors.0.statistics", "hours"),
            KeyField::CompressorStarts => nested("heating.compressors.0.statistics", "starts"),
            KeyField::CompressorStats => keys(&["heating.compressors.0.statistics"]),
            KeyField::BurnerActive => nested("heating.burners.0", "active"),
            KeyField::BurnerModulation => keys(&["heating.burners.0.modulation"]),
            KeyField::BurnerHours => nested("heating.burners.0.statistics", "hours"),
            KeyField::BurnerStarts => nested("heating.burners.0.statistics", "starts"),
            KeyField::VolumetricFlow => Lookup::Find {
                keys: &[
                    "heating.sensors.volumetricFlow.allengra",
                    "heating.sensors.volumetricFlow.return",
                ],
                patterns: &["volumetricFlow"],
            },
            KeyField::SupplyPressure => Lookup::Find {
                keys: &["heating.sensors.pressure.supply"],
                patterns: &["pressure.supply"],
            },
            KeyField::InternalPump => keys(&["heating.boiler.pumps.internal.current"]),
            KeyField::Fan0 => keys(&["heating.primaryCircuit.fans.0.current"]),
            KeyField::Fan1 => keys(&["heating.primaryCircuit.fans.1.current"]),
            /* seasonal figures only stand in when the instantaneous COP is missing */
            KeyField::CopTotal => keys(&["heating.cop.total", "heating.scop.total", "heating.spf.total"]),
            KeyField::CopHeating => {
                keys(&["heating.cop.heating", "heating.scop.heating", "heating.spf.heating"])
            }
            KeyField::CopDhw => keys(&["heating.cop.dhw", "heating.scop.dhw", "heating.spf.dhw"]),
            KeyField::CopCooling => keys(&["heating.cop.cooling", "heating.seer.cooling"]),
            KeyField::FourWayValve => keys(&["heating.valves.fourThreeWay.position"]),
            KeyField::DiverterValve => keys(&["heating.valves.diverter.heatDhw"]),
            KeyField::SecondaryHeater => keys(&[
                "heating.secondaryHeatGenerator.state",
                "heating.secondaryHeatGenerator.status",
            ]),
            KeyField::HeatingRod => nested("heating.heatingRod.status", "overall"),
            KeyField::EvaporatorTemp => keys(&["heating.evaporators.0.sensors.temperature.liquid"]),
            KeyField::EvaporatorOverheat => {
                keys(&["heating.evaporators.0.sensors.temperature.overheat"])
            }
            KeyField::CondenserTemp => keys(&["heating.condensors.0.sensors.temperature.liquid"]),
            KeyField::EconomizerTemp => keys(&["heating.economizers.0.sensors.temperature.liquid"]),
            KeyField::InverterTemp => keys(&["heating.inverters.0.sensors.temperature.powerModule"]),
            KeyField::DeviceName => nested("device.name", "name"),
            KeyField::DeviceSerial => keys(&["heating.boiler.serial", "device.serial"]),
            KeyField::ControllerSerial => keys(&["heating.controller.serial"]),
            KeyField::ProductIdentification => keys(&["device.productIdentification"]),
        }
    }
}

/// Array-valued history features, read from the flat feature list by exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive)]
pub enum HistoryField {
    PowerConsumptionTotal,
    PowerConsumptionHeating,
    PowerConsumptionDhw,
    PowerConsumptionCooling,
    HeatProductionHeating,
    HeatProductionDhw,
    HeatProductionCooling,
    GasConsumptionTotal,
    GasConsumptionHeating,
    GasConsumptionDhw,
}

pub const HISTORY_FIELD_COUNT: usize = HistoryField::GasConsumptionDhw as usize + 1;

impl HistoryField {
    pub fn all() -> impl Iterator<Item = HistoryField> {
        (0..HISTORY_FIELD_COUNT).filter_map(num::FromPrimitive::from_usize)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            HistoryField::PowerConsumptionTotal => "powerConsumptionTotal",
            HistoryField::PowerConsumptionHeating => "powerConsumptionHeating",
            HistoryField::PowerConsumptionDhw => "powerConsumptionDhw",
            HistoryField::PowerConsumptionCooling => "powerConsumptionCooling",
            HistoryField::HeatProductionHeating => "heatProductionHeating",
            HistoryField::HeatProductionDhw => "heatProductionDhw",
            HistoryField::HeatProductionCooling => "heatProductionCooling",
            HistoryField::GasConsumptionTotal => "gasConsumptionTotal",
            HistoryField::GasConsumptionHeating => "gasConsumptionHeating",
            HistoryField::GasConsumptionDhw => "gasConsumptionDhw",
        }
    }

    pub fn feature(self) -> &'static str {
        match self {
            HistoryField::PowerConsumptionTotal => "heating.power.consumption.total",
            HistoryField::PowerConsumptionHeating => "heating.power.consumption.heating",
            HistoryField::PowerConsumptionDhw => "heating.power.consumption.dhw",
            HistoryField::PowerConsumptionCooling => "heating.power.consumption.cooling",
            HistoryField::HeatProductionHeating => "heating.heat.production.heating",
            HistoryField::HeatProductionDhw => "heating.heat.production.dhw",
            HistoryField::HeatProductionCooling => "heating.heat.production.cooling",
            HistoryField::GasConsumptionTotal => "heating.gas.consumption.total",
            HistoryField::GasConsumptionHeating => "heating.gas.consumption.heating",
            HistoryField::GasConsumptionDhw => "heating.gas.consumption.dhw",
        }
    }
}
