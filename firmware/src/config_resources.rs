// Pin mapping for the LED strip controller board.

//
//| GPIO # | Name     | Description                                        |
//| ------ | -------- | -------------------------------------------------- |
//| 0      | LED_R    | Red strip channel. PWM slice 0, output A.          |
//| 2      | LED_G    | Green strip channel. PWM slice 1, output A.        |
//| 4      | LED_B    | Blue strip channel. PWM slice 2, output A.         |
//| 6      | LED_WW   | Warm white strip channel. PWM slice 3, output A.   |
//| 8      | LED_CW   | Cold white strip channel. PWM slice 4, output A.   |
//| 10     | SW_12V   | Rail select switch. Pull-up, high selects 12 V.    |
//| 15     | PD_RST   | STUSB4500 reset line. Held low (controller on).    |
//| 16     | I2C0_SDA | I2C bus to the STUSB4500.                          |
//| 17     | I2C0_SCL | I2C bus to the STUSB4500.                          |

use assign_resources::assign_resources;
use embassy_rp::peripherals;

assign_resources! {
  led_pwm: LedPwmResources {
    red_slice: PWM_SLICE0,
    red_pin: PIN_0,
    green_slice: PWM_SLICE1,
    green_pin: PIN_2,
    blue_slice: PWM_SLICE2,
    blue_pin: PIN_4,
    warm_white_slice: PWM_SLICE3,
    warm_white_pin: PIN_6,
    cold_white_slice: PWM_SLICE4,
    cold_white_pin: PIN_8,
  },
  pd_controller: PdControllerResources {
    i2c: I2C0,
    sda: PIN_16,
    scl: PIN_17,
    reset: PIN_15,
  },
  voltage_switch: VoltageSwitchResources {
    pin: PIN_10,
  },
}
