// hb-core/src/units.rs
//
// Plant data arrives in engineering units (bar, kPa, °C, MW, kJ/kg). The
// helpers below route every conversion through uom so the factors live in
// one place.

use uom::si::f64::{
    MassRate as UomMassRate, Power as UomPower, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn kpa(v: f64) -> Pressure {
    use uom::si::pressure::kilopascal;
    Pressure::new::<kilopascal>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn kw(v: f64) -> Power {
    use uom::si::power::kilowatt;
    Power::new::<kilowatt>(v)
}

#[inline]
pub fn mw(v: f64) -> Power {
    use uom::si::power::megawatt;
    Power::new::<megawatt>(v)
}

/// Absolute pressure in kPa to bar.
#[inline]
pub fn kpa_to_bar(v: f64) -> f64 {
    use uom::si::pressure::bar;
    kpa(v).get::<bar>()
}

/// Absolute pressure in bar to kPa.
#[inline]
pub fn bar_to_kpa(v: f64) -> f64 {
    use uom::si::pressure::kilopascal;
    bar(v).get::<kilopascal>()
}

/// Absolute pressure in bar to MPa (IF97 input unit).
#[inline]
pub fn bar_to_mpa(v: f64) -> f64 {
    use uom::si::pressure::megapascal;
    bar(v).get::<megapascal>()
}

#[inline]
pub fn celsius_to_kelvin(v: f64) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    degc(v).get::<kelvin>()
}

#[inline]
pub fn kelvin_to_celsius(v: f64) -> f64 {
    use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};
    Temperature::new::<kelvin>(v).get::<degree_celsius>()
}

/// Stream duty `m_dot * dh` (kg/s * kJ/kg = kW) expressed in MW.
#[inline]
pub fn duty_mw(m_dot_kg_s: f64, dh_kj_per_kg: f64) -> f64 {
    use uom::si::power::megawatt;
    kw(kgps(m_dot_kg_s).value * dh_kj_per_kg).get::<megawatt>()
}

/// MW to kW, for balances carried in kJ/s.
#[inline]
pub fn mw_to_kw(v: f64) -> f64 {
    use uom::si::power::kilowatt;
    mw(v).get::<kilowatt>()
}

pub mod constants {
    /// Standard atmosphere [bar].
    pub const P_ATM_BAR: f64 = 1.013_25;

    /// ISO reference ambient temperature [°C].
    pub const ISO_TEMP_C: f64 = 15.0;

    /// Liquid water specific heat [kJ/(kg·K)].
    pub const CP_WATER: f64 = 4.186;

    /// Water vapour specific heat [kJ/(kg·K)].
    pub const CP_VAPOUR: f64 = 1.87;

    /// Latent heat of vaporisation at 0 °C [kJ/kg].
    pub const H_FG_0C: f64 = 2501.0;
}
